// -
// Key layout

pub const DEFAULT_PREFIX_TEMPLATE: &str = "KitexConfig";
pub const DEFAULT_SERVER_PATH_TEMPLATE: &str = "{serverServiceName}/{category}";
pub const DEFAULT_CLIENT_PATH_TEMPLATE: &str =
    "{clientServiceName}/{serverServiceName}/{category}";

/// Method name that matches any method without an entry of its own
pub const WILDCARD_METHOD: &str = "*";

// -
// Policy categories

pub const RETRY_CATEGORY: &str = "retry";
pub const RPC_TIMEOUT_CATEGORY: &str = "rpc_timeout";
pub const CIRCUIT_BREAK_CATEGORY: &str = "circuit_break";
pub const LIMIT_CATEGORY: &str = "limit";
pub const DEGRADATION_CATEGORY: &str = "degradation";

// -
// Consul defaults

pub const CONSUL_DEFAULT_ADDRESS: &str = "127.0.0.1:8500";
pub const CONSUL_DEFAULT_DATACENTER: &str = "dc1";
pub const CONSUL_DEFAULT_TIMEOUT_MS: u64 = 5000;

pub(crate) const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";
pub(crate) const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";
