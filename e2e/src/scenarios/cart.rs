use super::log_in_as_standard_user;
use crate::{Context, Expect};
use anyhow::Result;
use tracing::info;

pub(crate) const ADD_BACKPACK: &str = "[data-test='add-to-cart-sauce-labs-backpack']";
const CART_BADGE: &str = "[data-test='shopping-cart-badge']";
const LOAD_TIME: &str =
    "() => performance.timing.loadEventEnd - performance.timing.navigationStart";

pub async fn add_to_cart(ctx: Context) -> Result<()> {
    log_in_as_standard_user(&ctx).await?;

    ctx.page.click(ADD_BACKPACK).await?;
    ctx.page.assert_text(CART_BADGE, "1").await?;

    let load_time = ctx.page.evaluate(LOAD_TIME).await?;
    info!(browser = %ctx.browser, load_ms = %load_time, "page load time");
    Ok(())
}
