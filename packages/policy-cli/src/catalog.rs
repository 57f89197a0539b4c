//! Policy types and countries offered by the interactive menus.

/// A named group of policy types.
pub struct PolicyCategory {
    pub name: &'static str,
    pub policies: &'static [&'static str],
}

pub const POLICY_CATEGORIES: &[PolicyCategory] = &[
    PolicyCategory {
        name: "Employment Policies",
        policies: &[
            "Employment Contract Policy",
            "Recruitment and Selection Policy",
            "Probationary Period Policy",
            "Termination and Dismissal Policy",
        ],
    },
    PolicyCategory {
        name: "Workplace Policies",
        policies: &[
            "Anti-Harassment and Discrimination Policy",
            "Health and Safety Policy",
            "Remote Work Policy",
            "Workplace Conduct Policy",
        ],
    },
    PolicyCategory {
        name: "Leave and Benefits",
        policies: &[
            "Annual Leave Policy",
            "Sick Leave Policy",
            "Maternity/Paternity Leave Policy",
            "Bereavement Leave Policy",
        ],
    },
    PolicyCategory {
        name: "Compensation",
        policies: &[
            "Salary and Wage Policy",
            "Overtime Policy",
            "Performance Bonus Policy",
            "Expense Reimbursement Policy",
        ],
    },
    PolicyCategory {
        name: "Data and Privacy",
        policies: &[
            "Employee Privacy Policy",
            "Data Protection Policy",
            "Confidentiality Policy",
            "Social Media Policy",
        ],
    },
];

pub const POPULAR_COUNTRIES: &[&str] = &[
    "United States",
    "United Kingdom",
    "Canada",
    "Australia",
    "Germany",
    "France",
    "Netherlands",
    "Singapore",
    "India",
    "South Africa",
];

/// Countries where employment law also varies by state or province.
pub const FEDERAL_COUNTRIES: &[&str] = &["United States", "Canada", "Australia", "India"];

pub fn is_federal(country: &str) -> bool {
    FEDERAL_COUNTRIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(country.trim()))
}

/// Prompt label for the subdivision of a federal country.
pub fn region_label(country: &str) -> &'static str {
    if country.trim().eq_ignore_ascii_case("Canada") {
        "province"
    } else {
        "state"
    }
}

pub fn all_policies() -> impl Iterator<Item = &'static str> {
    POLICY_CATEGORIES
        .iter()
        .flat_map(|category| category.policies.iter().copied())
}
