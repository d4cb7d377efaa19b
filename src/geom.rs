pub mod cache;
pub mod mesh;
pub mod point;
pub mod receivers;
pub mod tetrahedron;
pub mod vector;
