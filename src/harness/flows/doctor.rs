use crate::harness::flows::unique_suffix;
use crate::harness::{Driver, HarnessError};
use crate::ui::selectors;

pub async fn doctor_completes_an_appointment(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_doctor().await?;
    driver.visit("/doctor/dashboard/appointments").await?;

    driver.get_data_test("edit-appointment-button").first().click().await?;
    driver.get_data_test("status-input").type_text("Completed").await?;
    driver.get_data_test(selectors::UPDATE_BUTTON).click().await?;

    driver.contains("Appointment updated successfully!").await?;
    driver
        .get_data_test("appointment-row")
        .first()
        .should_contain("Completed")
        .await?;
    // 医生不能删除预约
    driver.get_data_test("delete-appointment-button").should_not_exist().await
}

pub async fn doctor_writes_a_prescription(driver: &mut Driver) -> Result<(), HarnessError> {
    let medicine = format!("Ibuprofen {}", unique_suffix());

    driver.login_as_doctor().await?;
    driver.visit("/doctor/dashboard/prescriptions").await?;
    driver.get_data_test("add-prescription-button").click().await?;
    driver.get_data_test("appointment-id-input").type_text("10").await?;
    driver.get_data_test("patient-id-input").type_text("3").await?;
    driver.get_data_test("medicine-input").type_text(&medicine).await?;
    driver.get_data_test("dosage-input").type_text("200mg after meals").await?;
    driver.get_data_test(selectors::SUBMIT_BUTTON).click().await?;

    driver.contains("Prescription added successfully!").await?;
    driver.get_data_test(selectors::SEARCH_INPUT).type_text(&medicine).await?;
    driver
        .get_data_test("prescription-name")
        .first()
        .should_contain(&medicine)
        .await
}

pub async fn doctor_cannot_manage_users(driver: &mut Driver) -> Result<(), HarnessError> {
    driver.login_as_doctor().await?;
    driver.visit("/admin/dashboard/users").await?;
    driver.should_be_on("/doctor/dashboard").await
}
