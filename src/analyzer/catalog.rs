//! Static table of known nginx directives.
//!
//! Each directive maps to a list of bit masks. A mask packs two fields: how
//! the directive takes its arguments (low word: argument counts, block, flag)
//! and the contexts it may appear in (high word). Directives that behave
//! differently per context carry one mask per valid combination.
//!
//! The table mirrors nginx's own directive registrations, with nginx+
//! directives included; entries are kept exactly as registered even where the
//! upstream table is quirky.

use std::collections::HashMap;
use std::sync::OnceLock;

// Argument-shape bits.

/// Takes no arguments
pub const CONF_NOARGS: u32 = 0x0000_0001;
/// Takes exactly 1 argument
pub const CONF_TAKE1: u32 = 0x0000_0002;
/// Takes exactly 2 arguments
pub const CONF_TAKE2: u32 = 0x0000_0004;
/// Takes exactly 3 arguments
pub const CONF_TAKE3: u32 = 0x0000_0008;
/// Takes exactly 4 arguments
pub const CONF_TAKE4: u32 = 0x0000_0010;
/// Takes exactly 5 arguments
pub const CONF_TAKE5: u32 = 0x0000_0020;
/// Takes exactly 6 arguments
pub const CONF_TAKE6: u32 = 0x0000_0040;
/// Opens a `{ … }` block
pub const CONF_BLOCK: u32 = 0x0000_0100;
/// Takes one argument that must be `on` or `off`
pub const CONF_FLAG: u32 = 0x0000_0200;
/// Takes any number of arguments
pub const CONF_ANY: u32 = 0x0000_0400;
/// Takes at least 1 argument
pub const CONF_1MORE: u32 = 0x0000_0800;
/// Takes at least 2 arguments
pub const CONF_2MORE: u32 = 0x0000_1000;

// Argument-shape aliases.

/// Takes 1 or 2 arguments
pub const CONF_TAKE12: u32 = CONF_TAKE1 | CONF_TAKE2;
/// Takes 2 or 3 arguments
pub const CONF_TAKE23: u32 = CONF_TAKE2 | CONF_TAKE3;
/// Takes 3 or 4 arguments
pub const CONF_TAKE34: u32 = CONF_TAKE3 | CONF_TAKE4;
/// Takes 1, 2 or 3 arguments
pub const CONF_TAKE123: u32 = CONF_TAKE12 | CONF_TAKE3;
/// Takes 1, 2, 3 or 4 arguments
pub const CONF_TAKE1234: u32 = CONF_TAKE123 | CONF_TAKE4;

// Context bits.

/// The main configuration file itself
pub const DIRECT_CONF: u32 = 0x0001_0000;
/// The main (top-level) context
pub const MAIN_CONF: u32 = 0x0004_0000;
/// `events` block
pub const EVENT_CONF: u32 = 0x0008_0000;
/// `mail` block
pub const MAIL_MAIN_CONF: u32 = 0x0010_0000;
/// `mail > server` block
pub const MAIL_SRV_CONF: u32 = 0x0020_0000;
/// `stream` block
pub const STREAM_MAIN_CONF: u32 = 0x0040_0000;
/// `stream > server` block
pub const STREAM_SRV_CONF: u32 = 0x0080_0000;
/// `stream > upstream` block
pub const STREAM_UPS_CONF: u32 = 0x0100_0000;
/// `http` block
pub const HTTP_MAIN_CONF: u32 = 0x0200_0000;
/// `http > server` block
pub const HTTP_SRV_CONF: u32 = 0x0400_0000;
/// `http > location` block (at any nesting depth)
pub const HTTP_LOC_CONF: u32 = 0x0800_0000;
/// `http > upstream` block
pub const HTTP_UPS_CONF: u32 = 0x1000_0000;
/// `http > server > if` block
pub const HTTP_SIF_CONF: u32 = 0x2000_0000;
/// `http > location > if` block
pub const HTTP_LIF_CONF: u32 = 0x4000_0000;
/// `http > location > limit_except` block
pub const HTTP_LMT_CONF: u32 = 0x8000_0000;

/// Every context except `if` and `limit_except` blocks.
pub const ANY_CONF: u32 = MAIN_CONF
    | EVENT_CONF
    | MAIL_MAIN_CONF
    | MAIL_SRV_CONF
    | STREAM_MAIN_CONF
    | STREAM_SRV_CONF
    | STREAM_UPS_CONF
    | HTTP_MAIN_CONF
    | HTTP_SRV_CONF
    | HTTP_LOC_CONF
    | HTTP_UPS_CONF;

/// Look up the bit masks registered for a directive name.
pub fn masks(name: &str) -> Option<&'static [u32]> {
    static INDEX: OnceLock<HashMap<&'static str, &'static [u32]>> = OnceLock::new();
    INDEX
        .get_or_init(|| DIRECTIVES.iter().map(|&(name, masks)| (name, masks)).collect())
        .get(name)
        .copied()
}

static DIRECTIVES: &[(&str, &[u32])] = &[
    ("absolute_redirect", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("accept_mutex", &[EVENT_CONF | CONF_FLAG]),
    ("accept_mutex_delay", &[EVENT_CONF | CONF_TAKE1]),
    ("access_log", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | HTTP_LMT_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("add_after_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("add_before_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("add_header", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE23,
    ]),
    ("add_trailer", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE23,
    ]),
    ("addition_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("aio", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("aio_write", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("alias", &[HTTP_LOC_CONF | CONF_TAKE1]),
    ("allow", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ancient_browser", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("ancient_browser_value", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("auth_basic", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1]),
    ("auth_basic_user_file", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1,
    ]),
    ("auth_http", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("auth_Httpheader", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE2]),
    ("auth_Httppass_client_cert", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG]),
    ("auth_Httptimeout", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("auth_request", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("auth_request_set", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("autoindex", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("autoindex_exact_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("autoindex_format", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("autoindex_localtime", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("break", &[HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_NOARGS]),
    ("charset", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("charset_map", &[HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE2]),
    ("charset_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("chunked_transfer_encoding", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("client_body_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("client_body_in_file_only", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("client_body_in_single_buffer", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
    ]),
    ("client_body_temp_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234]),
    ("client_body_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("client_header_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("client_header_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("client_max_body_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("connection_pool_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("create_full_put_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("daemon", &[MAIN_CONF | DIRECT_CONF | CONF_FLAG]),
    ("dav_access", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("dav_methods", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("debug_connection", &[EVENT_CONF | CONF_TAKE1]),
    ("debug_points", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("default_type", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("deny", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("directio", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("directio_alignment", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("disable_symlinks", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("empty_gif", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("env", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("error_log", &[
        MAIN_CONF | CONF_1MORE,
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("error_page", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_2MORE]),
    ("etag", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("events", &[MAIN_CONF | CONF_BLOCK | CONF_NOARGS]),
    ("expires", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE12]),
    ("fastcgi_bind", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("fastcgi_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("fastcgi_busy_buffers_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_background_update", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
    ]),
    ("fastcgi_cache_bypass", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_cache_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_lock", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_cache_lock_age", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_lock_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_max_range_offset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("fastcgi_cache_methods", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_cache_min_uses", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_path", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("fastcgi_cache_revalidate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_cache_use_stale", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_cache_valid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_catch_stderr", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_connect_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_force_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_hide_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_ignore_client_abort", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_ignore_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_index", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_intercept_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_keep_conn", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_max_temp_file_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_next_upstream", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_next_upStreamtimeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("fastcgi_next_upStreamtries", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_no_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("fastcgi_param", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE23]),
    ("fastcgi_pass", &[HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("fastcgi_pass_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_pass_request_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_pass_request_headers", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
    ]),
    ("fastcgi_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_request_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_send_lowat", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_socket_keepalive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("fastcgi_split_path_info", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_store", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_store_access", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("fastcgi_temp_file_write_size", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("fastcgi_temp_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234]),
    ("flv", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("geo", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE12,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_TAKE12,
    ]),
    ("geoip_city", &[
        HTTP_MAIN_CONF | CONF_TAKE12,
        STREAM_MAIN_CONF | CONF_TAKE12,
    ]),
    ("geoip_country", &[
        HTTP_MAIN_CONF | CONF_TAKE12,
        STREAM_MAIN_CONF | CONF_TAKE12,
    ]),
    ("geoip_org", &[
        HTTP_MAIN_CONF | CONF_TAKE12,
        STREAM_MAIN_CONF | CONF_TAKE12,
    ]),
    ("geoip_proxy", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("geoip_proxy_recursive", &[HTTP_MAIN_CONF | CONF_FLAG]),
    ("google_perftools_profiles", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("grpc_bind", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("grpc_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_connect_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_hide_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ignore_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("grpc_intercept_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("grpc_next_upstream", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("grpc_next_upStreamtimeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_next_upStreamtries", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_pass", &[HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("grpc_pass_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_set_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("grpc_socket_keepalive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("grpc_ssl_certificate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_certificate_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_ciphers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_crl", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_name", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_password_file", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("grpc_ssl_protocols", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("grpc_ssl_server_name", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("grpc_ssl_session_reuse", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("grpc_ssl_trusted_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("grpc_ssl_verify", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("grpc_ssl_verify_depth", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("gunzip", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("gunzip_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("gzip", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG]),
    ("gzip_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("gzip_comp_level", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("gzip_disable", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("gzip_Httpversion", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("gzip_min_length", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("gzip_proxied", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("gzip_static", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("gzip_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("gzip_vary", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("hash", &[
        HTTP_UPS_CONF | CONF_TAKE12,
        STREAM_UPS_CONF | CONF_TAKE12,
    ]),
    ("http", &[MAIN_CONF | CONF_BLOCK | CONF_NOARGS]),
    ("http2_body_preread_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_chunk_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("http2_idle_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_max_concurrent_pushes", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_max_concurrent_streams", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_max_field_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_max_header_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_max_requests", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("http2_push", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("http2_push_preload", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("http2_recv_buffer_size", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("http2_recv_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("if", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_BLOCK | CONF_1MORE]),
    ("if_modified_since", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("ignore_invalid_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("image_filter", &[HTTP_LOC_CONF | CONF_TAKE123]),
    ("image_filter_buffer", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("image_filter_interlace", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("image_filter_jpeg_quality", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("image_filter_sharpen", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("image_filter_transparency", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("image_filter_webp_quality", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("imap_auth", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("imap_capabilities", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("imap_client_buffer", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("include", &[ANY_CONF | CONF_TAKE1]),
    ("index", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("internal", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("ip_hash", &[HTTP_UPS_CONF | CONF_NOARGS]),
    ("keepalive", &[HTTP_UPS_CONF | CONF_TAKE1]),
    ("keepalive_disable", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("keepalive_requests", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        HTTP_UPS_CONF | CONF_TAKE1,
    ]),
    ("keepalive_timeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12,
        HTTP_UPS_CONF | CONF_TAKE1,
    ]),
    ("large_client_header_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE2]),
    ("least_conn", &[
        HTTP_UPS_CONF | CONF_NOARGS,
        STREAM_UPS_CONF | CONF_NOARGS,
    ]),
    ("limit_conn", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE2,
    ]),
    ("limit_conn_dry_run", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("limit_conn_log_level", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("limit_conn_status", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("limit_conn_zone", &[
        HTTP_MAIN_CONF | CONF_TAKE2,
        STREAM_MAIN_CONF | CONF_TAKE2,
    ]),
    ("limit_except", &[HTTP_LOC_CONF | CONF_BLOCK | CONF_1MORE]),
    ("limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("limit_rate_after", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1,
    ]),
    ("limit_req", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("limit_req_dry_run", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("limit_req_log_level", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("limit_req_status", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("limit_req_zone", &[HTTP_MAIN_CONF | CONF_TAKE34]),
    ("lingering_close", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("lingering_time", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("lingering_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("listen", &[
        HTTP_SRV_CONF | CONF_1MORE,
        MAIL_SRV_CONF | CONF_1MORE,
        STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("load_module", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("location", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_BLOCK | CONF_TAKE12]),
    ("lock_file", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("log_format", &[
        HTTP_MAIN_CONF | CONF_2MORE,
        STREAM_MAIN_CONF | CONF_2MORE,
    ]),
    ("log_not_found", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("log_subrequest", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("mail", &[MAIN_CONF | CONF_BLOCK | CONF_NOARGS]),
    ("map", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE2,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_TAKE2,
    ]),
    ("map_hash_bucket_size", &[
        HTTP_MAIN_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_TAKE1,
    ]),
    ("map_hash_max_size", &[
        HTTP_MAIN_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_TAKE1,
    ]),
    ("master_process", &[MAIN_CONF | DIRECT_CONF | CONF_FLAG]),
    ("max_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_bind", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("memcached_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_connect_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_gzip_flag", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_next_upstream", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("memcached_next_upStreamtimeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("memcached_next_upStreamtries", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("memcached_pass", &[HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("memcached_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("memcached_socket_keepalive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("merge_slashes", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("min_delete_depth", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("mirror", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("mirror_request_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("modern_browser", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("modern_browser_value", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("mp4", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("mp4_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("mp4_max_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("msie_padding", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("msie_refresh", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("multi_accept", &[EVENT_CONF | CONF_FLAG]),
    ("open_file_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("open_file_cache_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("open_file_cache_min_uses", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("open_file_cache_valid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("open_log_file_cache", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1234,
    ]),
    ("output_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("override_charset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG,
    ]),
    ("pcre_jit", &[MAIN_CONF | DIRECT_CONF | CONF_FLAG]),
    ("perl", &[HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1]),
    ("perl_modules", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("perl_require", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("perl_set", &[HTTP_MAIN_CONF | CONF_TAKE2]),
    ("pid", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("pop3_auth", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("pop3_capabilities", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("port_in_redirect", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("postpone_output", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("preread_buffer_size", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("preread_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("protocol", &[MAIL_SRV_CONF | CONF_TAKE1]),
    ("proxy_bind", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE12,
    ]),
    ("proxy_buffer", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("proxy_buffer_size", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("proxy_busy_buffers_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache_background_update", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
    ]),
    ("proxy_cache_bypass", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_cache_convert_head", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_cache_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache_lock", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_cache_lock_age", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache_lock_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache_max_range_offset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("proxy_cache_methods", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_cache_min_uses", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_cache_path", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("proxy_cache_revalidate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_cache_use_stale", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_cache_valid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_connect_timeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_cookie_domain", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("proxy_cookie_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("proxy_download_rate", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("proxy_force_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_headers_hash_bucket_size", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("proxy_headers_hash_max_size", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("proxy_hide_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_Httpversion", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_ignore_client_abort", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_ignore_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_intercept_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_max_temp_file_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_method", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_next_upstream", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("proxy_next_upStreamtimeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_next_upStreamtries", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_no_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("proxy_pass", &[
        HTTP_LOC_CONF | HTTP_LIF_CONF | HTTP_LMT_CONF | CONF_TAKE1,
        STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_pass_error_message", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG]),
    ("proxy_pass_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_pass_request_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_pass_request_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_protocol", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("proxy_protocol_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("proxy_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_redirect", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("proxy_request_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("proxy_requests", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("proxy_responses", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("proxy_send_lowat", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_set_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_set_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("proxy_socket_keepalive", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("proxy_ssl", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("proxy_ssl_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_certificate_key", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_ciphers", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_crl", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_name", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_password_file", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_protocols", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("proxy_ssl_server_name", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("proxy_ssl_session_reuse", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("proxy_ssl_trusted_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_ssl_verify", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("proxy_ssl_verify_depth", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_store", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_store_access", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("proxy_temp_file_write_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("proxy_temp_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234]),
    ("proxy_timeout", &[
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("proxy_upload_rate", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("random", &[
        HTTP_UPS_CONF | CONF_NOARGS | CONF_TAKE12,
        STREAM_UPS_CONF | CONF_NOARGS | CONF_TAKE12,
    ]),
    ("random_index", &[HTTP_LOC_CONF | CONF_FLAG]),
    ("read_ahead", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("real_ip_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("real_ip_recursive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("recursive_error_pages", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("referer_hash_bucket_size", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("referer_hash_max_size", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("request_pool_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("reset_timedout_connection", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("resolver", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("resolver_timeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("return", &[
        HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE12,
        STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("rewrite", &[HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE23]),
    ("rewrite_log", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG,
    ]),
    ("root", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("satisfy", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_bind", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("scgi_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("scgi_busy_buffers_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache_background_update", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
    ]),
    ("scgi_cache_bypass", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_cache_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache_lock", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_cache_lock_age", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache_lock_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache_max_range_offset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("scgi_cache_methods", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_cache_min_uses", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_cache_path", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("scgi_cache_revalidate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_cache_use_stale", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_cache_valid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_connect_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_force_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_hide_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_ignore_client_abort", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_ignore_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_intercept_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_max_temp_file_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_next_upstream", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_next_upStreamtimeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_next_upStreamtries", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_no_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("scgi_param", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE23]),
    ("scgi_pass", &[HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("scgi_pass_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_pass_request_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_pass_request_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_request_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_socket_keepalive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("scgi_store", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_store_access", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("scgi_temp_file_write_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("scgi_temp_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234]),
    ("secure_link", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("secure_link_md5", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("secure_link_secret", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("send_lowat", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("sendfile", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG]),
    ("sendfile_max_chunk", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("server", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_NOARGS,
        HTTP_UPS_CONF | CONF_1MORE,
        MAIL_MAIN_CONF | CONF_BLOCK | CONF_NOARGS,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_NOARGS,
        STREAM_UPS_CONF | CONF_1MORE,
    ]),
    ("server_name", &[
        HTTP_SRV_CONF | CONF_1MORE,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
    ]),
    ("server_name_in_redirect", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("server_names_hash_bucket_size", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("server_names_hash_max_size", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("server_tokens", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("set", &[HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE2]),
    ("set_real_ip_from", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("slice", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("smtp_auth", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("smtp_capabilities", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE]),
    ("smtp_client_buffer", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("smtp_greeting_delay", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("source_charset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1,
    ]),
    ("spdy_chunk_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("spdy_headers_comp", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("split_clients", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE2,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_TAKE2,
    ]),
    ("ssi", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG]),
    ("ssi_last_modified", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("ssi_min_file_chunk", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("ssi_silent_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("ssi_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("ssi_value_length", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("ssl", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG,
    ]),
    ("ssl_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("ssl_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_certificate_key", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_ciphers", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_client_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_crl", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_dhparam", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_early_data", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("ssl_ecdh_curve", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_engine", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("ssl_handshake_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("ssl_password_file", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_prefer_server_ciphers", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("ssl_preread", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("ssl_protocols", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_1MORE,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE,
    ]),
    ("ssl_session_cache", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE12,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE12,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE12,
    ]),
    ("ssl_session_ticket_key", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_session_tickets", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("ssl_session_timeout", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_stapling", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("ssl_stapling_file", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("ssl_stapling_responder", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1]),
    ("ssl_stapling_verify", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("ssl_trusted_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_verify_client", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("ssl_verify_depth", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_TAKE1,
        MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1,
    ]),
    ("starttls", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("stream", &[MAIN_CONF | CONF_BLOCK | CONF_NOARGS]),
    ("stub_status", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_NOARGS | CONF_TAKE1]),
    ("sub_filter", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("sub_filter_last_modified", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("sub_filter_once", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("sub_filter_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("subrequest_output_buffer_size", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("tcp_nodelay", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG,
        STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG,
    ]),
    ("tcp_nopush", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("thread_pool", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE23]),
    ("timeout", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_TAKE1]),
    ("timer_resolution", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("try_files", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_2MORE]),
    ("types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_BLOCK | CONF_NOARGS]),
    ("types_hash_bucket_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("types_hash_max_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("underscores_in_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | CONF_FLAG]),
    ("uninitialized_variable_warn", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_SIF_CONF | HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_FLAG,
    ]),
    ("upstream", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_TAKE1,
    ]),
    ("use", &[EVENT_CONF | CONF_TAKE1]),
    ("user", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE12]),
    ("userid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_domain", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_expires", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_mark", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_name", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_p3p", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("userid_service", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_bind", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("uwsgi_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("uwsgi_busy_buffers_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache_background_update", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("uwsgi_cache_bypass", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_cache_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache_lock", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_cache_lock_age", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache_lock_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache_max_range_offset", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("uwsgi_cache_methods", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_cache_min_uses", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_cache_path", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("uwsgi_cache_revalidate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_cache_use_stale", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_cache_valid", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_connect_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_force_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_hide_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ignore_client_abort", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_ignore_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_intercept_errors", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_max_temp_file_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_modifier1", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_modifier2", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_next_upstream", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_next_upStreamtimeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_next_upStreamtries", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_no_cache", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_param", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE23]),
    ("uwsgi_pass", &[HTTP_LOC_CONF | HTTP_LIF_CONF | CONF_TAKE1]),
    ("uwsgi_pass_header", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_pass_request_body", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_pass_request_headers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_read_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_request_buffering", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_send_timeout", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_socket_keepalive", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_ssl_certificate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_certificate_key", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_ciphers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_crl", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_name", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_password_file", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_ssl_protocols", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("uwsgi_ssl_server_name", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_ssl_session_reuse", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_ssl_trusted_certificate", &[
        HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1,
    ]),
    ("uwsgi_ssl_verify", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("uwsgi_ssl_verify_depth", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_store", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_store_access", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE123]),
    ("uwsgi_temp_file_write_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("uwsgi_temp_path", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1234]),
    ("valid_referers", &[HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("variables_hash_bucket_size", &[
        HTTP_MAIN_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_TAKE1,
    ]),
    ("variables_hash_max_size", &[
        HTTP_MAIN_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_TAKE1,
    ]),
    ("worker_aio_requests", &[EVENT_CONF | CONF_TAKE1]),
    ("worker_connections", &[EVENT_CONF | CONF_TAKE1]),
    ("worker_cpu_affinity", &[MAIN_CONF | DIRECT_CONF | CONF_1MORE]),
    ("worker_priority", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("worker_processes", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("worker_rlimit_core", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("worker_rlimit_nofile", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("worker_shutdown_timeout", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("working_directory", &[MAIN_CONF | DIRECT_CONF | CONF_TAKE1]),
    ("xclient", &[MAIL_MAIN_CONF | MAIL_SRV_CONF | CONF_FLAG]),
    ("xml_entities", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("xslt_last_modified", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("xslt_param", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("xslt_string_param", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("xslt_stylesheet", &[HTTP_LOC_CONF | CONF_1MORE]),
    ("xslt_types", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("zone", &[
        HTTP_UPS_CONF | CONF_TAKE12,
        STREAM_UPS_CONF | CONF_TAKE12,
    ]),
    // nginx+ directives, registrations inferred from the public docs
    ("api", &[HTTP_LOC_CONF | CONF_NOARGS | CONF_TAKE1]),
    ("auth_jwt", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("auth_jwt_claim_set", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("auth_jwt_header_set", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("auth_jwt_key_file", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("auth_jwt_key_request", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("auth_jwt_leeway", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("f4f", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("f4f_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("fastcgi_cache_purge", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("health_check", &[
        HTTP_LOC_CONF | CONF_ANY,
        STREAM_SRV_CONF | CONF_ANY,
    ]),
    ("health_check_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("hls", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("hls_buffers", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE2]),
    ("hls_forward_args", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("hls_fragment", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("hls_mp4_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("hls_mp4_max_buffer_size", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("js_access", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("js_content", &[HTTP_LOC_CONF | HTTP_LMT_CONF | CONF_TAKE1]),
    ("js_filter", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("js_include", &[
        HTTP_MAIN_CONF | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_TAKE1,
    ]),
    ("js_path", &[HTTP_MAIN_CONF | CONF_TAKE1]),
    ("js_preread", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("js_set", &[
        HTTP_MAIN_CONF | CONF_TAKE2,
        STREAM_MAIN_CONF | CONF_TAKE2,
    ]),
    ("keyval", &[
        HTTP_MAIN_CONF | CONF_TAKE3,
        STREAM_MAIN_CONF | CONF_TAKE3,
    ]),
    ("keyval_zone", &[
        HTTP_MAIN_CONF | CONF_1MORE,
        STREAM_MAIN_CONF | CONF_1MORE,
    ]),
    ("least_time", &[
        HTTP_UPS_CONF | CONF_TAKE12,
        STREAM_UPS_CONF | CONF_TAKE12,
    ]),
    ("limit_zone", &[HTTP_MAIN_CONF | CONF_TAKE3]),
    ("match", &[
        HTTP_MAIN_CONF | CONF_BLOCK | CONF_TAKE1,
        STREAM_MAIN_CONF | CONF_BLOCK | CONF_TAKE1,
    ]),
    ("memcached_force_ranges", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_FLAG]),
    ("mp4_limit_rate", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("mp4_limit_rate_after", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("ntlm", &[HTTP_UPS_CONF | CONF_NOARGS]),
    ("proxy_cache_purge", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("queue", &[HTTP_UPS_CONF | CONF_TAKE12]),
    ("scgi_cache_purge", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("session_log", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE1]),
    ("session_log_format", &[HTTP_MAIN_CONF | CONF_2MORE]),
    ("session_log_zone", &[HTTP_MAIN_CONF | CONF_TAKE23 | CONF_TAKE4 | CONF_TAKE5 | CONF_TAKE6]),
    ("state", &[
        HTTP_UPS_CONF | CONF_TAKE1,
        STREAM_UPS_CONF | CONF_TAKE1,
    ]),
    ("status", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("status_format", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_TAKE12]),
    ("status_zone", &[
        HTTP_SRV_CONF | CONF_TAKE1,
        STREAM_SRV_CONF | CONF_TAKE1,
        HTTP_LOC_CONF | CONF_TAKE1,
        HTTP_LIF_CONF | CONF_TAKE1,
    ]),
    ("sticky", &[HTTP_UPS_CONF | CONF_1MORE]),
    ("sticky_cookie_insert", &[HTTP_UPS_CONF | CONF_TAKE1234]),
    ("upStreamconf", &[HTTP_LOC_CONF | CONF_NOARGS]),
    ("uwsgi_cache_purge", &[HTTP_MAIN_CONF | HTTP_SRV_CONF | HTTP_LOC_CONF | CONF_1MORE]),
    ("zone_sync", &[STREAM_SRV_CONF | CONF_NOARGS]),
    ("zone_sync_buffers", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE2]),
    ("zone_sync_connect_retry_interval", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_connect_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_interval", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_recv_buffer_size", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_server", &[STREAM_SRV_CONF | CONF_TAKE12]),
    ("zone_sync_ssl", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("zone_sync_ssl_certificate", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_certificate_key", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_ciphers", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_crl", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_name", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_password_file", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_protocols", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_1MORE]),
    ("zone_sync_ssl_server_name", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("zone_sync_ssl_trusted_certificate", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_ssl_verify", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_FLAG]),
    ("zone_sync_ssl_verify_depth", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
    ("zone_sync_timeout", &[STREAM_MAIN_CONF | STREAM_SRV_CONF | CONF_TAKE1]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directive_lookup() {
        let masks = masks("worker_connections").unwrap();
        assert_eq!(masks, &[EVENT_CONF | CONF_TAKE1]);
    }

    #[test]
    fn unknown_directive_lookup() {
        assert!(masks("frobnicate").is_none());
    }

    #[test]
    fn location_takes_one_or_two_args() {
        let masks = masks("location").unwrap();
        assert_eq!(masks.len(), 1);
        let mask = masks[0];
        assert_ne!(mask & CONF_BLOCK, 0);
        assert_ne!(mask & CONF_TAKE1, 0);
        assert_ne!(mask & CONF_TAKE2, 0);
        assert_eq!(mask & (HTTP_SRV_CONF | HTTP_LOC_CONF), HTTP_SRV_CONF | HTTP_LOC_CONF);
    }

    #[test]
    fn per_context_masks_are_distinct() {
        let masks = masks("listen").unwrap();
        assert_eq!(masks.len(), 3);
        assert_ne!(masks[0] & HTTP_SRV_CONF, 0);
        assert_ne!(masks[1] & MAIL_SRV_CONF, 0);
        assert_ne!(masks[2] & STREAM_SRV_CONF, 0);
    }

    #[test]
    fn any_conf_excludes_if_contexts() {
        assert_eq!(ANY_CONF & HTTP_SIF_CONF, 0);
        assert_eq!(ANY_CONF & HTTP_LIF_CONF, 0);
        assert_eq!(ANY_CONF & HTTP_LMT_CONF, 0);
    }
}
