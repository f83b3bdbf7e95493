pub mod polling_thread;
