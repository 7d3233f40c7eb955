use serde_json::json;

use crate::api::HttpMethod;
use crate::ensure;
use crate::harness::flows::unique_suffix;
use crate::harness::{Driver, HarnessError};
use crate::ui::selectors;

const APPOINTMENTS: &str = "/patient/dashboard/appointments";

pub async fn patient_browses_doctors(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.visit("/patient/dashboard/doctors").await?;
    driver.get_data_test("doctor-row").should_exist().await?;
    // 病人只能查看
    driver.get_data_test("add-doctor-button").should_not_exist().await?;
    driver.get_data_test("delete-doctor-button").should_not_exist().await?;

    driver.get_data_test(selectors::SEARCH_INPUT).type_text("Cardiology").await?;
    driver.get_data_test("doctor-row").each_should_contain("Cardiology").await
}

pub async fn patient_books_an_appointment(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.visit(APPOINTMENTS).await?;
    driver.intercept("bookAppointment", HttpMethod::Post, "**/appointment/register")?;

    driver.get_data_test("add-appointment-button").click().await?;
    driver.get_data_test("doctor-id-input").type_text("2").await?;
    driver.get_data_test("date-input").type_text("2026-12-01").await?;
    driver.get_data_test("time-input").type_text("09:30").await?;
    driver.get_data_test("amount-input").type_text("150").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    let call = driver.wait("bookAppointment").await?;
    ensure!(call.status == 201, "booking returned {}", call.status);
    let patient_id = driver.state().session.current().user_id;
    ensure!(
        call.request_body.as_ref().map(|body| body["patientId"].as_i64()) == Some(patient_id),
        "booking was not sent for the signed-in patient"
    );

    driver.contains("Appointment added successfully!").await?;
    driver.get_data_test(selectors::SEARCH_INPUT).type_text("2026-12-01").await?;
    driver
        .get_data_test("appointment-row")
        .first()
        .should_contain("09:30")
        .await
}

pub async fn booking_errors_stay_inline(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.visit(APPOINTMENTS).await?;
    driver.intercept("bookAppointment", HttpMethod::Post, "**/appointment/register")?;

    driver.get_data_test("add-appointment-button").click().await?;
    driver.get_data_test("doctor-id-input").type_text("2").await?;
    driver.get_data_test("date-input").type_text("2026-12-02").await?;
    driver.get_data_test("time-input").type_text("10:00").await?;
    driver.get_data_test("amount-input").type_text("0").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    // 本地校验失败时不发请求
    driver
        .get_data_test("amount-error")
        .should_contain("Amount must be greater than zero")
        .await?;
    ensure!(driver.calls("bookAppointment") == 0, "invalid booking reached the backend");

    driver.get_data_test("amount-input").type_text("120").await?;
    driver.get_data_test("doctor-id-input").type_text("9999").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    let call = driver.wait("bookAppointment").await?;
    ensure!(call.status == 422, "expected 422, got {}", call.status);
    driver
        .get_data_test("doctor-id-error")
        .should_contain("Doctor does not exist")
        .await?;
    driver.get_data_test(selectors::CREATE_FORM).should_be_visible().await?;
    driver.get_data_test("toast-error").should_not_exist().await
}

pub async fn patient_pays_through_stubbed_gateway(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_patient().await?;
    driver.visit("/patient/dashboard/payments").await?;
    driver.intercept_with(
        "pay",
        HttpMethod::Post,
        "**/payment/register",
        201,
        json!({
            "id": 900,
            "appointmentId": 10,
            "amount": 150.0,
            "method": "card",
            "status": "Paid"
        }),
    )?;

    driver.get_data_test("add-payment-button").click().await?;
    driver.get_data_test("appointment-id-input").type_text("10").await?;
    driver.get_data_test("amount-input").type_text("150").await?;
    driver.get_data_test("method-input").type_text("card").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    let call = driver.wait("pay").await?;
    ensure!(call.status == 201, "stubbed payment returned {}", call.status);
    ensure!(
        call.request_body
            .as_ref()
            .is_some_and(|body| body["appointmentId"] == json!(10) && body["method"] == json!("card")),
        "unexpected payment body {:?}",
        call.request_body
    );
    driver.contains("Payment successful!").await
}

pub async fn patient_files_a_complaint(driver: &mut Driver) -> Result<(), HarnessError> {
    let subject = format!("Waiting room {}", unique_suffix());

    driver.login_as_patient().await?;
    driver.visit("/patient/dashboard/complaints").await?;
    driver.get_data_test("add-complaint-button").click().await?;
    driver.get_data_test("subject-input").type_text(&subject).await?;
    driver
        .get_data_test("description-input")
        .type_text("Waited over an hour past the booked time")
        .await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    driver.contains("Complaint added successfully!").await?;
    driver.get_data_test(selectors::SEARCH_INPUT).type_text(&subject).await?;
    driver
        .get_data_test("complaint-row")
        .first()
        .should_contain("Open")
        .await?;
    driver.get_data_test("edit-complaint-button").should_not_exist().await
}

pub async fn patient_views_profile(driver: &mut Driver) -> Result<(), HarnessError> {
    let email = driver.config().patient.email.clone();

    driver.login_as_patient().await?;
    driver.visit("/patient/dashboard/profile").await?;
    driver.get_data_test(selectors::PROFILE_EMAIL).should_contain(&email).await?;
    driver.get_data_test(selectors::PROFILE_ROLE).should_contain("patient").await
}
