//! Infrastructure adapters: persistence, coordinate reprojection and password hashing

pub mod credentials;
pub mod geodesy;
pub mod storage;
