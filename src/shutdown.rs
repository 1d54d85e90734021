use chrono::Local;

/// Whatever should happen once a shutdown has been requested by the switch.
pub trait ShutdownAction {
    fn shutdown(&self, shutdown_count: i32);
}

/// Announces the request on stdout and leaves the system running.
#[derive(Debug, Default)]
pub struct ReportOnly;

impl ShutdownAction for ReportOnly {
    fn shutdown(&self, shutdown_count: i32) {
        println!(
            "Shutdown {}! Requested at {}",
            shutdown_count,
            Local::now().format("%d-%m-%Y %H:%M:%S")
        );
    }
}

#[cfg(test)]
pub mod testing {
    use super::ShutdownAction;
    use std::cell::RefCell;

    /// Records every shutdown request instead of acting on it.
    #[derive(Debug, Default)]
    pub struct RecordingShutdown {
        pub requests: RefCell<Vec<i32>>,
    }

    impl ShutdownAction for RecordingShutdown {
        fn shutdown(&self, shutdown_count: i32) {
            self.requests.borrow_mut().push(shutdown_count);
        }
    }
}
