pub mod python;

pub use python::PyNetwork;
