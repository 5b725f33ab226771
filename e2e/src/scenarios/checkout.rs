use super::{cart::ADD_BACKPACK, log_in_as_standard_user};
use crate::{Context, Expect};
use anyhow::Result;

const ADD_BIKE_LIGHT: &str = "[data-test='add-to-cart-sauce-labs-bike-light']";
const CART_LINK: &str = "[data-test='shopping-cart-link']";
const REMOVE_BACKPACK: &str = "[data-test='remove-sauce-labs-backpack']";
const CHECKOUT: &str = "[data-test='checkout']";
const FIRST_NAME: &str = "[data-test='firstName']";
const LAST_NAME: &str = "[data-test='lastName']";
const POSTAL_CODE: &str = "[data-test='postalCode']";
const CONTINUE: &str = "[data-test='continue']";
const FINISH: &str = "[data-test='finish']";
const BACK_TO_PRODUCTS: &str = "[data-test='back-to-products']";

pub async fn checkout(ctx: Context) -> Result<()> {
    log_in_as_standard_user(&ctx).await?;

    ctx.page.click(ADD_BACKPACK).await?;
    ctx.page.click(ADD_BIKE_LIGHT).await?;
    ctx.page.click(CART_LINK).await?;
    ctx.page.screenshot(&ctx.artifact("cart.png")).await?;

    ctx.page.click(REMOVE_BACKPACK).await?;

    ctx.page.click(CHECKOUT).await?;
    ctx.page.assert_visible(FIRST_NAME).await?;
    ctx.page.fill(FIRST_NAME, "u").await?;
    ctx.page.fill(LAST_NAME, "j").await?;
    ctx.page.fill(POSTAL_CODE, "123").await?;
    ctx.page.click(CONTINUE).await?;

    ctx.page.assert_visible(FINISH).await?;
    ctx.page.click(FINISH).await?;
    ctx.page.assert_visible(BACK_TO_PRODUCTS).await?;
    ctx.page
        .screenshot(&ctx.artifact("checkout_complete.png"))
        .await
}
