pub mod decode;
pub mod impl_fs;
pub mod interface;
