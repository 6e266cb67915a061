//! Streams webcam frames into a remote detection service and draws the
//! results live.

pub mod capture {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_camera;
    }
}

pub mod display {
    pub mod domain {
        pub mod display_surface;
    }
    pub mod infrastructure {
        pub mod headless_display;
        pub mod minifb_window;
    }
}

pub mod pipeline;

pub mod service {
    pub mod domain {
        pub mod processing_service;
        pub mod service_kind;
    }
    pub mod infrastructure {
        pub mod credentials;
        pub mod http_service;
    }
}

pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod frame;
    pub mod stop_signal;
}

pub mod visualization {
    pub mod domain {
        pub mod visualizer;
    }
    pub mod infrastructure;
}

#[cfg(test)]
mod test_support;
