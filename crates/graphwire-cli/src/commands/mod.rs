pub mod describe;
pub mod dispatch;
pub mod tokenize;
pub mod version;
