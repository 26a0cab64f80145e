pub mod camera;
pub mod canvas;
pub mod frame;
pub mod march;
pub mod math;
pub mod normal;
pub mod parser;
pub mod ray;
pub mod render;
pub mod scene;
pub mod shade;
pub mod transform;
