mod application;
mod bank;
mod rate;

pub use application::{
    ApplicationFilter, ApplicationSortField, ApplicationStatus, MortgageApplication,
    NewMortgageApplication, SortOrder,
};
pub use bank::Bank;
pub use rate::{MortgageRate, RateListing, RateType};
