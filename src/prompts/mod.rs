//! Status prompt rendering

mod template;

pub use template::{
    load_status_template, render_status, render_status_from, render_template, StatusVariables,
};
