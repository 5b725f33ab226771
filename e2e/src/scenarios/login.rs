use super::{log_in, PASSWORD, STANDARD_USER, TITLE};
use crate::{Context, Expect};
use anyhow::Result;

const ERROR_BANNER: &str = "[data-test='error']";

pub async fn successful_login(ctx: Context) -> Result<()> {
    log_in(&ctx, STANDARD_USER, PASSWORD).await?;
    ctx.page.assert_text(TITLE, "Products").await?;
    ctx.page
        .screenshot(&ctx.artifact("successful_login.png"))
        .await
}

pub async fn invalid_login(ctx: Context) -> Result<()> {
    log_in(&ctx, "invalid_user", "wrong_password").await?;
    ctx.page.assert_visible(ERROR_BANNER).await?;
    ctx.page
        .screenshot(&ctx.artifact("invalid_login_error.png"))
        .await
}
