mod arg;
mod builder;
mod chained_reader;
mod multipart;
mod params;

pub use arg::{ArgValue, IntoArgValue, Rendered, UnsupportedArgument};
pub use builder::Request;
pub use chained_reader::ChainedReader;
pub use multipart::{FileAttachment, MultipartBody, MultipartClosed};
pub use params::Params;
