//! Sauce Demo flows. Every scenario starts from the login form.

use crate::{Context, Expect};
use anyhow::Result;

mod cart;
mod checkout;
mod login;

pub use cart::add_to_cart;
pub use checkout::checkout;
pub use login::{invalid_login, successful_login};

pub const STANDARD_USER: &str = "standard_user";
pub const PASSWORD: &str = "secret_sauce";

pub(crate) const USERNAME: &str = "[data-test='username']";
pub(crate) const PASSWORD_INPUT: &str = "[data-test='password']";
pub(crate) const LOGIN_BUTTON: &str = "[data-test='login-button']";
pub(crate) const TITLE: &str = "[data-test='title']";

pub(crate) async fn log_in(ctx: &Context, username: &str, password: &str) -> Result<()> {
    ctx.page.navigate(&ctx.base_url).await?;
    ctx.page.fill(USERNAME, username).await?;
    ctx.page.fill(PASSWORD_INPUT, password).await?;
    ctx.page.click(LOGIN_BUTTON).await
}

/// Logs in as the standard user and waits for the inventory page.
pub(crate) async fn log_in_as_standard_user(ctx: &Context) -> Result<()> {
    log_in(ctx, STANDARD_USER, PASSWORD).await?;
    ctx.page.assert_visible(TITLE).await
}
