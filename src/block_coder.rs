pub mod bit_pack;
pub mod bit_width;
pub mod frame_pack;
pub mod frame_unpack;
pub mod predict;

pub use frame_pack::pack_frame;
pub use frame_unpack::unpack_frame;
