use std::fmt;

#[derive(Debug)]
pub enum RerollError {
    IoError(std::io::Error),
    HttpError(Box<ureq::Error>),
    JsonError(serde_json::Error),
    FromUtf8Error(std::string::FromUtf8Error),
    Generic(String),
}

impl fmt::Display for RerollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RerollError::IoError(e) => write!(f, "IO error: {}", e),
            RerollError::HttpError(e) => write!(f, "HTTP error: {}", e),
            RerollError::JsonError(e) => write!(f, "JSON error: {}", e),
            RerollError::FromUtf8Error(e) => write!(f, "From UTF-8 error: {}", e),
            RerollError::Generic(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RerollError {}

impl From<std::io::Error> for RerollError {
    fn from(err: std::io::Error) -> Self {
        RerollError::IoError(err)
    }
}

impl From<ureq::Error> for RerollError {
    fn from(err: ureq::Error) -> Self {
        RerollError::HttpError(Box::new(err))
    }
}

impl From<serde_json::Error> for RerollError {
    fn from(err: serde_json::Error) -> Self {
        RerollError::JsonError(err)
    }
}

impl From<std::string::FromUtf8Error> for RerollError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RerollError::FromUtf8Error(err)
    }
}
