pub mod render_config;
