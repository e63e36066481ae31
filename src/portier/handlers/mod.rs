pub mod captcha;
pub use self::captcha::captcha;

pub mod health;
pub use self::health::health;

pub mod me;
pub use self::me::me;
