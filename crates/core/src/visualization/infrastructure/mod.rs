pub mod face_box_visualizer;
pub mod visualizer_factory;
