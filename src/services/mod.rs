pub mod alerts;
pub mod database;
pub mod email;
pub mod error_log;
pub mod jwt;
pub mod sms;

pub use alerts::{AlertThrottle, DbHealth, SystemAlerts};
pub use database::MongoDb;
pub use email::{EmailProvider, MockMailer, SmtpMailer};
pub use error_log::ErrorLogger;
pub use jwt::{Claims, JwtService, Role, INVALID_TOKEN_MESSAGE};
pub use sms::{LoggingSms, SmsProvider, TwilioSms};
