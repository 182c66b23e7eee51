//! Users domain actions - account creation and lookup

mod create_user;

pub use create_user::{bootstrap_admin, create_user, current_user, NewUser, MIN_PASSWORD_LENGTH};
