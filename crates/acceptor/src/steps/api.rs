//! Booking API steps.

use serde_json::Value;
use tracing::info;

use super::{ensure, ScenarioContext, StepArgs, StepFuture, StepGroup, StepTable};
use crate::booking::schema::{BOOKING_CREATED_SCHEMA, BOOKING_SCHEMA};
use crate::booking::{Auth, Booking, BookingPatch, CreatedBooking};
use crate::config::Credentials;
use crate::result::{AcceptorError, AcceptorResult};

/// Reference that never names a real booking
const INVALID_BOOKING_ID: &str = "999999999";

/// Token sent when a scenario has none
const INVALID_TOKEN: &str = "invalid-token";

pub(super) fn register(table: &mut StepTable) -> AcceptorResult<()> {
    let group = StepGroup::Api;

    // Arrange
    table.register(group, "I have valid booking credentials", valid_credentials)?;
    table.register(
        group,
        "I have a new hotel booking with the following details",
        new_booking_details,
    )?;
    table.register(group, "a booking has been created", booking_exists)?;
    table.register(group, "I have updated booking details", updated_details)?;
    table.register(
        group,
        "I want to update specific booking details",
        partial_details,
    )?;
    table.register(group, "I have an invalid booking reference", invalid_reference)?;
    table.register(group, "I do not have valid authorization", no_authorization)?;

    // Act
    table.register(group, "I create the booking", create_booking)?;
    table.register(group, "I request the booking details", request_booking)?;
    table.register(group, "I update the booking", update_booking)?;
    table.register(group, "I partially update the booking", patch_booking)?;
    table.register(group, "I cancel the booking", cancel_booking)?;
    table.register(group, "I attempt to update the booking", attempt_update)?;

    // Assert
    table.register(group, "the booking should be created successfully", created)?;
    table.register(group, "I should receive a booking confirmation", confirmation)?;
    table.register(
        group,
        "I should receive the correct booking information",
        correct_information,
    )?;
    table.register(group, "the booking data should be valid", data_valid)?;
    table.register(group, "the booking should be updated successfully", updated)?;
    table.register(
        group,
        "I should receive the updated booking details",
        updated_body,
    )?;
    table.register(group, "the booking should be cancelled successfully", cancelled)?;
    table.register(group, "the booking should no longer be accessible", gone)?;
    table.register(group, "I should receive a not found error", not_found)?;
    table.register(group, "I should receive an unauthorized error", forbidden)?;

    // Older phrasing kept for existing feature files
    table.register(
        group,
        "the Restful Booker API is available and returns a {status_code:d} status code for the authentication endpoint",
        auth_endpoint_status,
    )?;
    table.register(group, "I create the following bookings", create_rows)?;
    table.register(
        group,
        "the response should have a {status_code:d} status code",
        response_status,
    )?;
    table.register(
        group,
        "the response should have the following details",
        response_details,
    )?;
    table.register(group, "a hotel booking is created", hotel_booking_created)?;
    table.register(group, "the booking details are provided", details_provided)?;
    table.register(group, "a booking ID is obtained", booking_id_obtained)?;
    table.register(group, "the booking service is healthy", service_healthy)?;
    Ok(())
}

/// POST the booking, remembering id, body and expected state on success
async fn create(ctx: &mut ScenarioContext, booking: &Booking) -> AcceptorResult<()> {
    let response = ctx.api().create(booking).await?;
    if response.status == 200 {
        let created: CreatedBooking = response.json()?;
        info!(booking_id = created.bookingid, "booking created");
        ctx.booking_id = Some(created.bookingid.to_string());
        ctx.booking = Some(response.value()?);
        ctx.expected = Some(created.booking);
    }
    ctx.response = Some(response);
    Ok(())
}

fn details_from_table(args: &StepArgs) -> AcceptorResult<Booking> {
    Booking::from_row(&args.table()?.first_row()?)
}

fn status_arg(args: &StepArgs) -> AcceptorResult<u16> {
    let code = args.get_int("status_code")?;
    u16::try_from(code).map_err(|_| AcceptorError::invalid("status_code", code.to_string()))
}

fn valid_credentials<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let credentials = ctx.config().credentials.clone();
        ctx.auth = ctx.api().token(&credentials).await?;
        ctx.credentials = Some(credentials);
        Ok(())
    })
}

fn new_booking_details<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.booking_details = Some(details_from_table(args)?);
        Ok(())
    })
}

/// Creates the booking unless the scenario already holds one
fn booking_exists<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        if ctx.booking_id.is_some() {
            return Ok(());
        }
        if args.table_opt().is_some() {
            ctx.booking_details = Some(details_from_table(args)?);
        }
        let details = ctx
            .booking_details
            .clone()
            .ok_or_else(|| AcceptorError::missing("booking details"))?;
        create(ctx, &details).await?;
        ctx.last_response()?.expect_status(200)?;
        ensure(ctx.booking_id.is_some(), "no booking id after create")
    })
}

fn updated_details<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.updated_details = Some(details_from_table(args)?);
        Ok(())
    })
}

fn partial_details<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let patch = BookingPatch::from_row(&args.table()?.first_row()?)?;
        ensure(!patch.is_empty(), "partial update names no fields")?;
        ctx.partial_update = Some(patch);
        Ok(())
    })
}

fn invalid_reference<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.booking_id = Some(INVALID_BOOKING_ID.to_string());
        ctx.expected = None;
        Ok(())
    })
}

fn no_authorization<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.auth = Auth::None;
        Ok(())
    })
}

fn create_booking<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let details = ctx
            .booking_details
            .clone()
            .ok_or_else(|| AcceptorError::missing("booking details"))?;
        create(ctx, &details).await
    })
}

fn request_booking<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        let response = ctx.api().get(&id).await?;
        if response.status == 200 {
            ctx.booking = Some(response.value()?);
        }
        ctx.response = Some(response);
        Ok(())
    })
}

fn update_booking<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        let details = ctx
            .updated_details
            .clone()
            .ok_or_else(|| AcceptorError::missing("updated booking details"))?;
        ctx.ensure_token().await?;
        let response = ctx.api().update(&id, &details, &ctx.auth).await?;
        if response.status == 200 {
            ctx.booking = Some(response.value()?);
            ctx.expected = Some(details);
        }
        ctx.response = Some(response);
        Ok(())
    })
}

fn patch_booking<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        let patch = ctx
            .partial_update
            .clone()
            .ok_or_else(|| AcceptorError::missing("partial update details"))?;
        ctx.ensure_token().await?;
        let response = ctx.api().partial_update(&id, &patch, &ctx.auth).await?;
        if response.status == 200 {
            ctx.booking = Some(response.value()?);
            if let Some(expected) = ctx.expected.as_mut() {
                patch.apply(expected);
            }
        }
        ctx.response = Some(response);
        Ok(())
    })
}

fn cancel_booking<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        ctx.ensure_token().await?;
        let response = ctx.api().delete(&id, &ctx.auth).await?;
        if response.status == 201 {
            info!(booking_id = %id, "booking cancelled");
            ctx.expected = None;
        }
        ctx.response = Some(response);
        Ok(())
    })
}

/// Full update with whatever authorization the scenario holds, or a
/// token the API will reject
fn attempt_update<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        let details = ctx
            .updated_details
            .clone()
            .or_else(|| ctx.booking_details.clone())
            .ok_or_else(|| AcceptorError::missing("booking details"))?;
        let auth = if ctx.auth.is_none() {
            Auth::token(INVALID_TOKEN)
        } else {
            ctx.auth.clone()
        };
        let response = ctx.api().update(&id, &details, &auth).await?;
        ctx.response = Some(response);
        Ok(())
    })
}

fn created<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        ctx.last_response()?.expect_status(200)?;
        ensure(ctx.booking_id.is_some(), "no booking id in the create response")
    })
}

fn confirmation<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let body = ctx.last_response()?.value()?;
        ensure(
            body.get("bookingid").is_some_and(Value::is_u64),
            "confirmation has no numeric bookingid",
        )?;
        ensure(
            body.get("booking").is_some_and(Value::is_object),
            "confirmation has no booking",
        )
    })
}

/// 200, and the fields equal what the scenario last sent
fn correct_information<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let response = ctx.last_response()?;
        response.expect_status(200)?;
        let actual: Booking = response.json()?;
        if let Some(expected) = ctx.expected.as_ref() {
            ensure(
                &actual == expected,
                format!("booking differs: expected {expected:?}, got {actual:?}"),
            )?;
        }
        Ok(())
    })
}

fn data_valid<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let response = ctx.last_response()?;
        response.expect_status(200)?;
        let body = response.value()?;
        ctx.schemas().validate(BOOKING_SCHEMA, &body)
    })
}

fn updated<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.last_response()?.expect_status(200) })
}

fn updated_body<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let response = ctx.last_response()?;
        response.expect_status(200)?;
        let body = response.value()?;
        for field in ["firstname", "lastname", "totalprice"] {
            ensure(
                body.get(field).is_some(),
                format!("updated booking has no '{field}'"),
            )?;
        }
        if let Some(expected) = ctx.expected.as_ref() {
            let actual: Booking = response.json()?;
            ensure(
                &actual == expected,
                format!("updated booking differs: expected {expected:?}, got {actual:?}"),
            )?;
        }
        Ok(())
    })
}

fn cancelled<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.last_response()?.expect_status(201) })
}

fn gone<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?.to_string();
        let response = ctx.api().get(&id).await?;
        response.expect_status(404)?;
        ctx.response = Some(response);
        Ok(())
    })
}

fn not_found<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.last_response()?.expect_status(404) })
}

fn forbidden<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move { ctx.last_response()?.expect_status(403) })
}

fn auth_endpoint_status<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = status_arg(args)?;
        let credentials: Credentials = ctx.config().credentials.clone();
        let response = ctx.api().auth(&credentials).await?;
        response.expect_status(expected)?;
        let body = response.value()?;
        ensure(
            body.get("token").is_some_and(Value::is_string),
            "auth response has no token",
        )?;
        ensure(
            body.get("reason").is_none(),
            format!("auth was rejected: {body}"),
        )?;
        ctx.response = Some(response);
        Ok(())
    })
}

/// One POST per table row; the last response is kept
fn create_rows<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let rows = args.table()?.rows_as_maps();
        ensure(!rows.is_empty(), "no bookings in the table")?;
        for row in &rows {
            let booking = Booking::from_row(row)?;
            create(ctx, &booking).await?;
        }
        Ok(())
    })
}

fn response_status<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let expected = status_arg(args)?;
        ctx.last_response()?.expect_status(expected)
    })
}

/// Compares the last created booking with the first table row; a
/// `bookingid` column is compared too when present
fn response_details<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let row = args.table()?.first_row()?;
        let created: CreatedBooking = ctx.last_response()?.json()?;
        let expected = Booking::from_row(&row)?;
        ensure(
            created.booking == expected,
            format!("booking differs: expected {expected:?}, got {:?}", created.booking),
        )?;
        if let Some(id) = row.get("bookingid") {
            ensure(
                created.bookingid.to_string() == *id,
                format!("expected bookingid {id}, got {}", created.bookingid),
            )?;
        }
        Ok(())
    })
}

fn hotel_booking_created<'a>(ctx: &'a mut ScenarioContext, args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let booking = match args.table_opt() {
            Some(table) => Booking::from_row(&table.first_row()?)?,
            None => ctx
                .booking_details
                .clone()
                .ok_or_else(|| AcceptorError::missing("booking details"))?,
        };
        ctx.booking_details = Some(booking.clone());
        create(ctx, &booking).await?;
        ctx.last_response()?.expect_status(200)
    })
}

/// Validates the create confirmation against its schema
fn details_provided<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let body = ctx.last_response()?.value()?;
        ctx.schemas().validate(BOOKING_CREATED_SCHEMA, &body)
    })
}

fn booking_id_obtained<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let id = ctx.booking_id()?;
        ensure(
            id.parse::<u64>().is_ok(),
            format!("booking id '{id}' is not numeric"),
        )
    })
}

fn service_healthy<'a>(ctx: &'a mut ScenarioContext, _args: &'a StepArgs) -> StepFuture<'a> {
    Box::pin(async move {
        let response = ctx.api().ping().await?;
        response.expect_status(201)?;
        ctx.response = Some(response);
        Ok(())
    })
}
