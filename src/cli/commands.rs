use clap::Subcommand;

use super::call::CallArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the webhook adapter HTTP server
    Serve(ServeArgs),

    /// Run one webhook body through the adapter and print the response
    Call(CallArgs),
}
