use serde_json::json;

use crate::api::HttpMethod;
use crate::ensure;
use crate::harness::flows::unique_suffix;
use crate::harness::{Driver, HarnessError};
use crate::router::LOGIN_ROUTE;
use crate::ui::selectors;

pub async fn admin_login_lands_on_dashboard(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_admin().await?;
    driver.contains("Login successful!").await?;
    driver
        .get_data_test(selectors::WELCOME_MESSAGE)
        .should_contain("admin")
        .await?;
    driver.get_data_test(selectors::LOGOUT_BUTTON).should_be_visible().await
}

pub async fn invalid_credentials_show_an_error(driver: &mut Driver) -> Result<(), HarnessError> {
    let email = driver.config().admin.email.clone();
    driver.visit(LOGIN_ROUTE).await?;
    driver.get_data_test(selectors::EMAIL_INPUT).type_text(&email).await?;
    driver
        .get_data_test(selectors::PASSWORD_INPUT)
        .type_text("definitely-wrong")
        .await?;
    driver.get_data_test(selectors::LOGIN_BUTTON).click().await?;

    driver.contains("Invalid email or password").await?;
    driver.should_be_on(LOGIN_ROUTE).await
}

pub async fn signup_rejects_mismatched_passwords(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.intercept("register", HttpMethod::Post, "**/user/register")?;
    driver.visit("/signup").await?;

    driver.get_data_test(selectors::FULL_NAME_INPUT).type_text("Mismatched Person").await?;
    driver
        .get_data_test(selectors::EMAIL_INPUT)
        .type_text(&format!("mismatch-{}@careconnect.test", unique_suffix()))
        .await?;
    driver.get_data_test(selectors::PASSWORD_INPUT).type_text("Password123!").await?;
    driver
        .get_data_test(selectors::CONFIRM_PASSWORD_INPUT)
        .type_text("Password321!")
        .await?;
    driver.get_data_test(selectors::SIGNUP_BUTTON).click().await?;

    driver.contains("Passwords must match").await?;
    ensure!(
        driver.calls("register") == 0,
        "registration request was sent despite invalid form"
    );
    driver.should_be_on("/signup").await
}

pub async fn signup_registers_a_new_patient(driver: &mut Driver) -> Result<(), HarnessError> {
    let email = format!("patient-{}@careconnect.test", unique_suffix());
    let password = "Password123!";

    driver.intercept("register", HttpMethod::Post, "**/user/register")?;
    driver.visit("/signup").await?;
    driver.get_data_test(selectors::FULL_NAME_INPUT).type_text("New Patient").await?;
    driver.get_data_test(selectors::EMAIL_INPUT).type_text(&email).await?;
    driver.get_data_test(selectors::PASSWORD_INPUT).type_text(password).await?;
    driver
        .get_data_test(selectors::CONFIRM_PASSWORD_INPUT)
        .type_text(password)
        .await?;
    driver.get_data_test(selectors::SIGNUP_BUTTON).click().await?;

    let call = driver.wait("register").await?;
    ensure!(
        (200..300).contains(&call.status),
        "registration returned {}",
        call.status
    );
    ensure!(
        call.request_body
            .as_ref()
            .is_some_and(|body| body["email"] == json!(email)),
        "registration body did not carry the email"
    );
    driver.contains("Registration successful").await?;
    driver.should_be_on(LOGIN_ROUTE).await?;

    driver.get_data_test(selectors::EMAIL_INPUT).type_text(&email).await?;
    driver.get_data_test(selectors::PASSWORD_INPUT).type_text(password).await?;
    driver.get_data_test(selectors::LOGIN_BUTTON).click().await?;
    driver.should_be_on("/patient/dashboard").await
}

pub async fn logout_returns_to_login(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.get_data_test(selectors::LOGOUT_BUTTON).click().await?;
    driver.should_be_on(LOGIN_ROUTE).await?;
    driver.contains("Logged out successfully").await?;

    driver.visit("/patient/dashboard").await?;
    driver.should_be_on(LOGIN_ROUTE).await
}

pub async fn patient_cannot_open_admin_routes(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.visit("/admin/dashboard/appointments").await?;
    driver.should_be_on("/patient/dashboard").await
}

pub async fn expired_session_returns_to_login(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.intercept_with(
        "prescriptions",
        HttpMethod::Get,
        "**/prescriptions",
        401,
        json!({ "error": "Token expired" }),
    )?;

    driver.visit("/patient/dashboard/prescriptions").await?;
    driver.wait("prescriptions").await?;
    driver.should_be_on(LOGIN_ROUTE).await?;
    driver.contains("Your session has expired").await?;
    ensure!(
        driver.state().session.state().is_guest(),
        "session survived a 401"
    );
    Ok(())
}
