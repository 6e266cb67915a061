pub mod frame_feeder;
pub mod frame_iterator;
pub mod render_loop;
pub mod response_collector;
pub mod stream_error;
pub mod stream_logger;
pub mod streaming_pipeline;
