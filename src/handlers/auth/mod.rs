pub mod login;
pub mod profile;
pub mod refresh;

pub use login::login_post;
pub use profile::profile_get;
pub use refresh::refresh_post;
