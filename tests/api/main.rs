mod auth;
mod dashboard_subscribe;
mod health_check;
mod helpers;
mod subscriptions;
