//! File formats: boundary input and OBJ exports.

mod lop;
mod obj;

pub use lop::{LopError, parse_lop, read_lop, try_read_lop, write_lop};
pub use obj::{write_domain_eval, write_domain_mesh, write_segments};
