//! Storefront steps: login, logout, cart and checkout.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::{ensure, ScenarioContext, StepArgs, StepFuture, StepGroup, StepTable};
use crate::locators;
use crate::pages::{CheckoutInfo, Screen};
use crate::result::{AcceptorError, AcceptorResult};

pub(super) fn register(table: &mut StepTable) -> AcceptorResult<()> {
    let group = StepGroup::Ui;
    table.register(group, "a user is on the login page", on_login_page)?;
    table.register(
        group,
        r#"the user enters credentials "{username}" and "{password}""#,
        enter_credentials,
    )?;
    table.register(group, "the user opens the navigation menu", open_menu)?;
    table.register(group, "the user is able to login", login_succeeded)?;
    table.register(group, "the user is not able to login", login_failed)?;
    table.register(
        group,
        r#"the user should see an error message "{message}""#,
        error_message_shown,
    )?;
    table.register(group, "the user clicks on the logout button", click_logout)?;
    table.register(group, "the user is logged out", logged_out)?;
    table.register(
        group,
        "the product page should load in less than {seconds:d} second",
        product_page_load_time,
    )?;
    table.register(
        group,
        "the product page should load in less than {seconds:d} seconds",
        product_page_load_time,
    )?;
    table.register(
        group,
        r#"the user adds the product "{product_name}" to the cart"#,
        add_to_cart,
    )?;
    table.register(group, "the user clicks on the cart icon", click_cart_icon)?;
    table.register(
        group,
        r#"the product "{product_name}" is in the cart"#,
        product_in_cart,
    )?;
    table.register(group, "the user clicks checkout", click_checkout)?;
    table.register(group, "the checkout page loads", checkout_loaded)?;
    table.register(group, "the user enters their information", enter_information)?;
    table.register(group, "the user clicks continue", click_continue)?;
    table.register(group, "the checkout overview page loads", overview_loaded)?;
    table.register(group, "the user clicks finish", click_finish)?;
    table.register(group, "the confirmation page loads", confirmation_loaded)?;
    Ok(())
}

fn on_login_page<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let login = ctx.pages()?.login_page();
        login.open().await?;
        ensure(login.is_loaded().await, "login page did not load")
    })
}

fn enter_credentials<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let username = args.get("username")?;
        let password = args.get("password")?;
        let login = ctx.pages()?.login_page();
        info!(username, "attempting login");
        ensure(
            login.enter_username(username).await,
            "could not enter username",
        )?;
        ensure(
            login.enter_password(password).await,
            "could not enter password",
        )?;
        let start = Instant::now();
        let clicked = login.click_login_button().await;
        ctx.start = Some(start);
        ensure(clicked, "could not click the login button")
    })
}

fn open_menu<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product = ctx.pages()?.product_page();
        ensure(
            product.open_navigation_menu().await,
            "could not open the navigation menu",
        )
    })
}

fn login_succeeded<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let pages = ctx.pages()?;
        ensure(
            pages.login_page().is_login_successful().await,
            "login was not successful",
        )?;
        ensure(
            pages.product_page().has_correct_title().await,
            "product page title is incorrect",
        )
    })
}

fn login_failed<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let pages = ctx.pages()?;
        ensure(
            pages.login_page().is_error_message_displayed().await,
            "no error message after a rejected login",
        )?;
        ensure(
            !pages.product_page().is_loaded().await,
            "product page loaded after a rejected login",
        )
    })
}

fn error_message_shown<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let message = args.get("message")?;
        let login = ctx.pages()?.login_page();
        if let Some(locator) = locators::error_for_message(message) {
            let timeout = ctx.config().timeouts.error_banner;
            ensure(
                login.ui().is_present(&locator, timeout).await,
                format!("error message '{message}' is not displayed"),
            )?;
        }
        let shown = login.error_message().await;
        ensure(
            shown.as_deref() == Some(message),
            format!("expected error message '{message}', got {shown:?}"),
        )
    })
}

fn click_logout<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product = ctx.pages()?.product_page();
        ensure(product.click_logout().await, "could not click the logout link")
    })
}

fn logged_out<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product = ctx.pages()?.product_page();
        ensure(product.is_logged_out().await, "user is still logged in")
    })
}

/// Slow loads are reported, not failed
fn product_page_load_time<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let seconds = args.get_int("seconds")?;
        let budget = u64::try_from(seconds)
            .map(Duration::from_secs)
            .map_err(|_| AcceptorError::invalid("seconds", seconds.to_string()))?;
        let start = ctx
            .start
            .ok_or_else(|| AcceptorError::missing("login start time"))?;
        let timeout = ctx.config().timeouts.presence;
        let product = ctx.pages()?.product_page();
        ensure(
            product.wait_for_page_load(timeout).await,
            "product page did not load",
        )?;

        let elapsed = start.elapsed();
        if elapsed >= budget {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "product page loaded slower than expected"
            );
        } else {
            info!(elapsed_ms = elapsed.as_millis() as u64, "product page loaded");
        }
        Ok(())
    })
}

fn add_to_cart<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product_name = args.get("product_name")?;
        let product = ctx.pages()?.product_page();
        ensure(
            product.add_product_to_cart(product_name).await,
            format!("could not add '{product_name}' to the cart"),
        )
    })
}

fn click_cart_icon<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product = ctx.pages()?.product_page();
        ensure(product.click_cart_icon().await, "could not open the cart")
    })
}

fn product_in_cart<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let product_name = args.get("product_name")?;
        let cart = ctx.pages()?.cart_page();
        ensure(
            cart.verify_cart_contents(product_name).await,
            format!("'{product_name}' is not in the cart"),
        )
    })
}

fn click_checkout<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let cart = ctx.pages()?.cart_page();
        ensure(
            cart.click_checkout_button().await,
            "could not click the checkout button",
        )
    })
}

fn checkout_loaded<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let checkout = ctx.pages()?.checkout_page();
        ensure(checkout.verify().await, "checkout page did not load")
    })
}

/// Reads `First Name`, `Last Name` and `Zip/Postal Code` from the first
/// table row; without a table the default buyer is used
fn enter_information<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let info = match args.table_opt() {
            Some(table) => {
                let row = table.first_row()?;
                let column = |name: &str| {
                    row.get(name)
                        .cloned()
                        .ok_or_else(|| AcceptorError::missing(format!("table column '{name}'")))
                };
                CheckoutInfo::new(
                    column("First Name")?,
                    column("Last Name")?,
                    column("Zip/Postal Code")?,
                )
            }
            None => CheckoutInfo::default(),
        };
        let checkout = ctx.pages()?.checkout_page();
        ensure(
            checkout.fill_checkout_form(&info).await,
            "could not fill in the checkout form",
        )
    })
}

fn click_continue<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let checkout = ctx.pages()?.checkout_page();
        ensure(
            checkout.click_continue_button().await,
            "could not click continue",
        )
    })
}

fn overview_loaded<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let overview = ctx.pages()?.checkout_overview_page();
        ensure(overview.verify().await, "checkout overview page did not load")
    })
}

fn click_finish<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let overview = ctx.pages()?.checkout_overview_page();
        ensure(
            overview.click_finish_button().await,
            "could not click finish",
        )
    })
}

fn confirmation_loaded<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let complete = ctx.pages()?.checkout_complete_page();
        ensure(complete.verify().await, "confirmation page did not load")
    })
}
