use async_trait::async_trait;

use crate::api::models::{Appointment, Doctor, Me, User};
use crate::api::{Api, Get, List, QuerySubscription};
use crate::session::SessionState;
use crate::ui::UiError;
use crate::ui::pages::{Effect, Page, no_such_element};
use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;

/// 角色首页；与预约列表页共享同一个缓存条目
pub struct DashboardPage {
    route: String,
    state: SessionState,
    appointments: QuerySubscription<Vec<Appointment>>,
}

impl DashboardPage {
    pub fn new(route: &str, state: SessionState, api: &Api) -> Self {
        Self {
            route: route.to_string(),
            state,
            appointments: api.subscribe(&List::<Appointment>::new(), ()),
        }
    }
}

#[async_trait]
impl Page for DashboardPage {
    fn route(&self) -> &str {
        &self.route
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(&self.route);
        let role = self.state.role().map(|r| r.as_str()).unwrap_or("guest");
        screen.push(Element::new(selectors::PAGE_HEADING, "Dashboard"));
        screen.push(Element::new(
            selectors::WELCOME_MESSAGE,
            format!("Welcome to the {role} dashboard"),
        ));

        let result = self.appointments.current();
        match &result.data {
            Some(appointments) => screen.push(Element::new(
                selectors::APPOINTMENT_COUNT,
                format!("{} appointments", appointments.len()),
            )),
            None if result.is_error() => {
                if let Some(error) = &result.error {
                    screen.push(Element::new(selectors::ERROR_MESSAGE, error.user_message()));
                }
            }
            None => screen.push(Element::new(selectors::LOADING, "Loading appointments...")),
        }
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, _value: &str) -> Result<(), UiError> {
        Err(no_such_element(selector, index))
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        Err(no_such_element(selector, index))
    }

    async fn settle(&mut self) {
        self.appointments.settled().await;
    }
}

pub struct ProfilePage {
    route: String,
    me: QuerySubscription<User>,
}

impl ProfilePage {
    pub fn new(route: &str, api: &Api) -> Self {
        Self {
            route: route.to_string(),
            me: api.subscribe(&Me, ()),
        }
    }
}

#[async_trait]
impl Page for ProfilePage {
    fn route(&self) -> &str {
        &self.route
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(&self.route);
        screen.push(Element::new(selectors::PAGE_HEADING, "My Profile"));
        let result = self.me.current();
        match (&result.data, &result.error) {
            (Some(user), _) => {
                screen.push(Element::new(selectors::PROFILE_NAME, user.full_name.as_str()));
                screen.push(Element::new(selectors::PROFILE_EMAIL, user.email.as_str()));
                screen.push(Element::new(selectors::PROFILE_ROLE, user.role.as_str()));
            }
            (None, Some(error)) => {
                screen.push(Element::new(selectors::ERROR_MESSAGE, error.user_message()));
            }
            (None, None) => screen.push(Element::new(selectors::LOADING, "Loading profile...")),
        }
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, _value: &str) -> Result<(), UiError> {
        Err(no_such_element(selector, index))
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        Err(no_such_element(selector, index))
    }

    async fn settle(&mut self) {
        self.me.settled().await;
    }
}

/// `/admin/dashboard/doctors/:id`
pub struct DoctorDetailPage {
    route: String,
    doctor: Option<QuerySubscription<Doctor>>,
}

impl DoctorDetailPage {
    pub fn new(route: &str, api: &Api) -> Self {
        let id = route.rsplit('/').next().and_then(|raw| raw.parse::<i64>().ok());
        Self {
            route: route.to_string(),
            doctor: id.map(|id| api.subscribe(&Get::<Doctor>::new(), id)),
        }
    }
}

#[async_trait]
impl Page for DoctorDetailPage {
    fn route(&self) -> &str {
        &self.route
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(&self.route);
        let Some(doctor) = &self.doctor else {
            screen.push(Element::new(selectors::ERROR_MESSAGE, "Doctor not found"));
            return screen;
        };
        let result = doctor.current();
        match (&result.data, &result.error) {
            (Some(doctor), _) => {
                screen.push(Element::new(selectors::PAGE_HEADING, doctor.full_name.as_str()));
                screen.push(Element::new("doctor-specialization", doctor.specialization.as_str()));
                screen.push(Element::new(
                    "doctor-experience",
                    format!("{} years", doctor.experience_years),
                ));
                screen.push(Element::new("doctor-fee", format!("${:.2}", doctor.fee)));
            }
            (None, Some(error)) => {
                screen.push(Element::new(selectors::ERROR_MESSAGE, error.user_message()));
            }
            (None, None) => screen.push(Element::new(selectors::LOADING, "Loading doctor...")),
        }
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, _value: &str) -> Result<(), UiError> {
        Err(no_such_element(selector, index))
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        Err(no_such_element(selector, index))
    }

    async fn settle(&mut self) {
        if let Some(doctor) = self.doctor.as_mut() {
            doctor.settled().await;
        }
    }
}

/// 公开页面，不请求数据
pub struct StaticPage {
    route: String,
}

impl StaticPage {
    pub fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
        }
    }

    fn heading(&self) -> &'static str {
        match self.route.as_str() {
            "/" => "Welcome to CareConnect",
            "/about" => "About Us",
            "/services" => "Our Services",
            "/contact" => "Contact Us",
            _ => "Page not found",
        }
    }
}

#[async_trait]
impl Page for StaticPage {
    fn route(&self) -> &str {
        &self.route
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(&self.route);
        screen.push(Element::new(selectors::PAGE_HEADING, self.heading()));
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, _value: &str) -> Result<(), UiError> {
        Err(no_such_element(selector, index))
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        Err(no_such_element(selector, index))
    }
}
