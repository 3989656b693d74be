pub mod batch;
pub mod codec;
pub mod encode;
pub mod handlers;
pub mod params;
pub mod responses;
pub mod scale;
