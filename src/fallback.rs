//! # Demo Data Fallback
//!
//! Canned payloads served in place of 404/401 responses on well-known
//! endpoints, so dashboards stay populated while the backend is unavailable.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const SUBSCRIPTIONS_PREFIX: &str = "/api/subscriptions/";
/// Public plan listing, exempt from subscription error tagging
pub const PUBLIC_PLANS_PATH: &str = "/api/subscriptions/plans/";

/// Canned payload for `path`, matched exactly (base URL and query stripped)
pub fn lookup(path: &str) -> Option<&'static Value> {
    table().get(path)
}

/// Paths whose failures are tagged as silent subscription errors
pub fn is_subscription_path(path: &str) -> bool {
    path.starts_with(SUBSCRIPTIONS_PREFIX) && path != PUBLIC_PLANS_PATH
}

/// Every path with a canned payload
pub fn paths() -> impl Iterator<Item = &'static str> {
    table().keys().copied()
}

fn table() -> &'static HashMap<&'static str, Value> {
    static TABLE: OnceLock<HashMap<&'static str, Value>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> HashMap<&'static str, Value> {
    let doctors = json!([
        {
            "id": 1,
            "first_name": "Amina",
            "last_name": "Okafor",
            "specialization": "Endocrinology",
            "department": "Internal Medicine",
            "license_number": "MD-10231",
            "years_of_experience": 12,
            "is_available": true
        },
        {
            "id": 2,
            "first_name": "Daniel",
            "last_name": "Reyes",
            "specialization": "Cardiology",
            "department": "Cardiology",
            "license_number": "MD-20877",
            "years_of_experience": 8,
            "is_available": false
        }
    ]);

    let staff = json!([
        {"id": 1, "name": "Grace Lin", "role": "Head Nurse", "department": "Emergency", "shift": "day"},
        {"id": 2, "name": "Tomas Novak", "role": "Pharmacist", "department": "Pharmacy", "shift": "night"}
    ]);

    let diabetes_patients = json!([
        {
            "id": 1,
            "name": "Leila Haddad",
            "age": 54,
            "diabetes_type": "type_2",
            "last_hba1c": 7.2,
            "last_glucose": 142.5,
            "risk_level": "moderate"
        },
        {
            "id": 2,
            "name": "Samuel Osei",
            "age": 19,
            "diabetes_type": "type_1",
            "last_hba1c": 8.1,
            "last_glucose": 188.0,
            "risk_level": "high"
        }
    ]);

    let dashboard_stats = json!({
        "total_doctors": 24,
        "total_patients": 312,
        "total_staff": 57,
        "appointments_today": 41,
        "monthly_admissions": [32, 41, 38, 45, 52, 49],
        "bed_occupancy_rate": 0.78
    });

    let plans = json!([
        {"id": "basic", "name": "Basic", "price": 49.0, "interval": "month", "max_doctors": 5},
        {"id": "professional", "name": "Professional", "price": 149.0, "interval": "month", "max_doctors": 25},
        {"id": "enterprise", "name": "Enterprise", "price": 499.0, "interval": "month", "max_doctors": null}
    ]);

    HashMap::from([
        ("/api/dashboard/stats/", dashboard_stats),
        ("/api/doctors/", doctors),
        ("/api/staff/", staff),
        ("/api/diabetes/patients/", diabetes_patients),
        (
            "/api/diabetes/stats/",
            json!({
                "total_patients": 86,
                "type_1": 14,
                "type_2": 68,
                "gestational": 4,
                "average_hba1c": 7.4,
                "high_risk": 11
            }),
        ),
        (
            "/api/admin/dashboard/stats/",
            json!({
                "total_users": 140,
                "active_subscriptions": 18,
                "monthly_revenue": 4230.5,
                "new_signups": [4, 7, 3, 9, 12, 6]
            }),
        ),
        (
            "/api/admin/users/stats/",
            json!({"admins": 3, "doctors": 24, "staff": 57, "patients": 56}),
        ),
        (PUBLIC_PLANS_PATH, plans),
        (
            "/api/auth/user/",
            json!({
                "id": 0,
                "username": "demo",
                "email": "demo@example.com",
                "role": "admin",
                "is_superuser": false
            }),
        ),
    ])
}
