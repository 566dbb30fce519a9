pub mod components;
pub mod host;
pub mod parser;
pub mod status;

pub use components::{HostKind, UriComponents};
pub use host::IdnEncoder;
pub use parser::{parse_uri, parse_uri_checked, UriParseOptions};
pub use status::{UriStatus, UriStatusCode, UriWarning, ERROR_BIT};
