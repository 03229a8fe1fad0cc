pub mod planar;
pub mod pose;
pub mod spatial_matrix;
pub mod spatial_vector;
pub mod symmetric;
