pub mod ecl;
pub mod egl;
pub mod egx;
pub mod eml;
pub mod eol;
pub mod etl;
pub mod evl;
