mod url;

pub use url::{Mapping, ShortenRequest, ShortenResponse};
