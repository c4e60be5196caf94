//! MySQL/MariaDB driver implementation

mod connection;
mod dialect;
mod driver;
mod schema;

pub use connection::{MySqlConnection, ServerFlavor, ZeroDateBehavior, mysql_charset};
pub use dialect::{MYSQL_IDENTIFIER_QUOTE, MYSQL_MAX_LIMIT, mysql_type_map};
pub use driver::{MYSQL_DEFAULT_PARAMS, MySqlDriver};
