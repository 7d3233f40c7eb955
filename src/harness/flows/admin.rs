use crate::api::HttpMethod;
use crate::api::models::ServiceByTitle;
use crate::ensure;
use crate::harness::flows::unique_suffix;
use crate::harness::{Driver, HarnessError};
use crate::ui::selectors;

const APPOINTMENTS: &str = "/admin/dashboard/appointments";
const DOCTORS: &str = "/admin/dashboard/doctors";
const SERVICES: &str = "/admin/dashboard/services";
const COMPLAINTS: &str = "/admin/dashboard/complaints";

pub async fn admin_views_appointments_without_redirect(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_admin().await?;
    driver.visit(APPOINTMENTS).await?;
    driver.should_be_on(APPOINTMENTS).await?;
    driver.get_data_test("appointment-row").should_exist().await?;
    driver.get_data_test(selectors::ERROR_MESSAGE).should_not_exist().await
}

pub async fn admin_updates_an_appointment(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_admin().await?;
    driver.visit(APPOINTMENTS).await?;
    driver.intercept("updateAppointment", HttpMethod::Put, "**/appointment/*")?;

    driver.get_data_test("edit-appointment-button").first().click().await?;
    driver.get_data_test(selectors::UPDATE_MODAL).should_be_visible().await?;
    driver.get_data_test("date-input").type_text("2025-08-15").await?;
    driver.get_data_test("time-input").type_text("10:00:00").await?;
    driver.get_data_test("status-input").type_text("Confirmed").await?;
    driver.get_data_test("amount-input").type_text("7500").await?;
    driver.get_data_test(selectors::UPDATE_BUTTON).click().await?;

    let call = driver.wait("updateAppointment").await?;
    ensure!(call.method == HttpMethod::Put, "expected PUT, got {}", call.method);
    ensure!(call.status == 200, "update returned {}", call.status);
    let sent = call.request_body.unwrap_or_default();
    ensure!(
        sent["date"] == "2025-08-15" && sent["time"] == "10:00:00",
        "request carried date {} time {}",
        sent["date"],
        sent["time"]
    );
    ensure!(
        call.response_body["amount"].as_f64() == Some(7500.0),
        "response carried amount {}",
        call.response_body["amount"]
    );

    driver.contains("Appointment updated successfully!").await?;
    driver.get_data_test(selectors::UPDATE_MODAL).should_not_exist().await?;
    // 列表由失效后的重新请求刷新
    driver
        .get_data_test("appointment-row")
        .first()
        .should_contain("2025-08-15 10:00")
        .await?;
    driver
        .get_data_test("appointment-row")
        .first()
        .should_contain("Confirmed | $7500.00")
        .await
}

pub async fn admin_searches_doctors(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_admin().await?;
    driver.visit(DOCTORS).await?;

    driver.get_data_test(selectors::SEARCH_INPUT).type_text("Dennis").await?;
    driver.get_data_test("doctor-name").each_should_contain("Dennis").await?;

    // 搜索不区分大小写
    driver.get_data_test(selectors::SEARCH_INPUT).type_text("dennis").await?;
    let names = driver.get_data_test("doctor-name").texts().await?;
    ensure!(names.len() >= 2, "expected both seeded Dennis doctors, found {names:?}");
    ensure!(
        names.iter().all(|name| name.to_lowercase().contains("dennis")),
        "lowercase search returned {names:?}"
    );

    driver.get_data_test(selectors::SEARCH_INPUT).type_text("Zzzzxyz").await?;
    driver.contains("No doctors found").await?;
    driver.get_data_test("doctor-row").should_not_exist().await?;

    driver.get_data_test(selectors::CLEAR_FILTERS).should_contain("Clear Filters").await?;
    driver.get_data_test(selectors::CLEAR_FILTERS).click().await?;
    driver.get_data_test(selectors::SEARCH_INPUT).should_have_value("").await?;
    driver.get_data_test("doctor-row").should_exist().await?;
    driver.get_data_test(selectors::NO_RESULTS).should_not_exist().await
}

pub async fn admin_deletes_a_doctor(driver: &mut Driver) -> Result<(), HarnessError> {
    let suffix = unique_suffix();
    let name = format!("Temp Doctor {suffix}");

    driver.login_as_admin().await?;
    driver.visit(DOCTORS).await?;

    driver.get_data_test("add-doctor-button").click().await?;
    driver.get_data_test("full-name-input").type_text(&name).await?;
    driver
        .get_data_test("email-input")
        .type_text(&format!("temp-{suffix}@careconnect.test"))
        .await?;
    driver.get_data_test("specialization-input").type_text("Radiology").await?;
    driver.get_data_test("experience-input").type_text("4").await?;
    driver.get_data_test("fee-input").type_text("95").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;
    driver.contains("Doctor added successfully!").await?;

    driver.get_data_test(selectors::SEARCH_INPUT).type_text(&name).await?;
    driver.get_data_test("doctor-name").should_have_length(1).await?;

    driver.intercept("deleteDoctor", HttpMethod::Delete, "**/doctor/*")?;
    driver.get_data_test("delete-doctor-button").first().click().await?;
    driver
        .get_data_test(selectors::DELETE_MODAL)
        .should_contain("Are you sure")
        .await?;
    driver.get_data_test(selectors::CONFIRM_DELETE_BUTTON).click().await?;

    let call = driver.wait("deleteDoctor").await?;
    ensure!(call.method == HttpMethod::Delete, "expected DELETE, got {}", call.method);
    ensure!(call.path.starts_with("/doctor/"), "unexpected path {}", call.path);
    ensure!(call.status == 200, "delete returned {}", call.status);

    driver.contains("Doctor deleted successfully").await?;
    driver.contains("No doctors found").await
}

pub async fn admin_creates_and_removes_a_service(driver: &mut Driver) -> Result<(), HarnessError> {
    let title = format!("Telehealth {}", unique_suffix());

    driver.login_as_admin().await?;
    driver.visit(SERVICES).await?;
    driver.get_data_test("add-service-button").click().await?;
    driver.get_data_test("title-input").type_text(&title).await?;
    driver
        .get_data_test("description-input")
        .type_text("Video consultations")
        .await?;
    driver.get_data_test("price-input").type_text("45").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;
    driver.contains("Service added successfully!").await?;

    // 按标题查找同一条记录
    let found = driver.state().api.query(&ServiceByTitle, title.clone()).await;
    ensure!(
        found.data.as_ref().is_some_and(|service| service.title == title),
        "service {title} not found by title: {:?}",
        found.error
    );

    driver.get_data_test(selectors::SEARCH_INPUT).type_text(&title).await?;
    driver.get_data_test("delete-service-button").first().click().await?;
    driver.get_data_test(selectors::CONFIRM_DELETE_BUTTON).click().await?;
    driver.contains("Service deleted successfully").await?;
    driver.get_data_test("service-row").should_not_exist().await
}

pub async fn admin_resolves_a_complaint(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_admin().await?;
    driver.visit(COMPLAINTS).await?;

    driver.get_data_test("edit-complaint-button").first().click().await?;
    driver.get_data_test("status-input").type_text("Resolved").await?;
    driver.get_data_test(selectors::UPDATE_BUTTON).click().await?;

    driver.contains("Complaint updated successfully!").await?;
    driver
        .get_data_test("complaint-row")
        .first()
        .should_contain("Resolved")
        .await
}
