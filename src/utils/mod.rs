pub mod collation;
pub mod decompression;
pub mod http_client;
pub mod time;
pub mod url;

pub use collation::{compare_group_title, locale_compare};
pub use decompression::{CompressionFormat, DecompressionService};
pub use http_client::{DecompressingHttpClient, StandardHttpClient};
pub use time::{TimezonePolicy, parse_xmltv_timestamp};
pub use url::UrlUtils;
