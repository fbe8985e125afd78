//! Entity catalog: the record kinds served under `/api/<path_segment>`.
//!
//! Every record table gets `id` and `created_at` in addition to the columns listed here.

use crate::case::to_camel_case;

/// Storage column holding the generated identifier.
pub const ID_COLUMN: &str = "id";
/// Storage column holding the creation timestamp.
pub const CREATED_AT_COLUMN: &str = "created_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, trimmed on write. `None` means unbounded.
    Text { max_length: Option<u32> },
    /// Quantity stored as NUMERIC(18,4), defaults to zero.
    Decimal,
    /// Boolean flag, defaults to false.
    Flag,
    /// Optional point in time.
    Timestamp,
    /// Detail line items serialized as a JSON array in a text column.
    Details,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    /// Storage (snake_case) name.
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnDef {
    pub const fn text(name: &'static str, max_length: u32) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Text {
                max_length: Some(max_length),
            },
            required: false,
        }
    }

    pub const fn required_text(name: &'static str, max_length: u32) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Text {
                max_length: Some(max_length),
            },
            required: true,
        }
    }

    pub const fn long_text(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Text { max_length: None },
            required: false,
        }
    }

    pub const fn decimal(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Decimal,
            required: false,
        }
    }

    pub const fn flag(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Flag,
            required: false,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Timestamp,
            required: false,
        }
    }

    /// Detail lists are always required to hold at least one row.
    pub const fn details(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Details,
            required: true,
        }
    }

    /// Field name used in request and response bodies.
    pub fn api_name(&self) -> String {
        to_camel_case(self.name)
    }
}

#[derive(Debug)]
pub struct EntityDef {
    /// Human-readable kind, used in logs.
    pub name: &'static str,
    pub table_name: &'static str,
    pub path_segment: &'static str,
    pub columns: &'static [ColumnDef],
    /// Returned with 400 when a required field or the detail list is missing.
    pub required_message: &'static str,
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_details(&self) -> bool {
        self.columns.iter().any(|c| c.kind == ColumnKind::Details)
    }
}

pub static PARAMETER_MASTER: EntityDef = EntityDef {
    name: "parameter master",
    table_name: "parameter_master",
    path_segment: "parameters",
    columns: &[
        ColumnDef::required_text("parameter_type", 100),
        ColumnDef::required_text("parameter_name", 150),
        ColumnDef::required_text("process_product", 150),
        ColumnDef::required_text("spec_characteristic", 150),
        ColumnDef::required_text("parameter_code", 100),
    ],
    required_message: "All parameter fields are required.",
};

pub static PRODUCT_INSPECTIONS: EntityDef = EntityDef {
    name: "product inspection",
    table_name: "product_inspections",
    path_segment: "product-inspections",
    columns: &[
        ColumnDef::required_text("item_id", 100),
        ColumnDef::required_text("item_description", 255),
        ColumnDef::text("production_order_no", 100),
        ColumnDef::text("receipt_from_production", 150),
        ColumnDef::text("inspected_by", 150),
        ColumnDef::text("control_plan_no", 100),
        ColumnDef::text("container_bag_no", 100),
        ColumnDef::text("bottle_pellet_no", 100),
        ColumnDef::text("doc_number", 50),
        ColumnDef::timestamp("inspection_date"),
        ColumnDef::timestamp("production_order_date"),
        ColumnDef::decimal("sample_qty"),
        ColumnDef::text("department", 150),
        ColumnDef::flag("pre_production"),
        ColumnDef::decimal("produced_qty"),
        ColumnDef::decimal("accepted_qty"),
        ColumnDef::decimal("rejected_qty"),
        ColumnDef::text("status", 100),
        ColumnDef::text("remarks", 255),
        ColumnDef::long_text("special_instructions"),
        ColumnDef::details("details"),
    ],
    required_message: "Item information and at least one detail row are required.",
};

pub static INCOMING_MATERIAL_INSPECTIONS: EntityDef = EntityDef {
    name: "incoming material inspection",
    table_name: "incoming_material_inspections",
    path_segment: "incoming-material-inspections",
    columns: &[
        ColumnDef::text("inward_type", 100),
        ColumnDef::text("grn_type", 100),
        ColumnDef::text("supplier_vendor", 255),
        ColumnDef::flag("rework_location"),
        ColumnDef::flag("inspection_required"),
        ColumnDef::flag("test_certificate"),
        ColumnDef::flag("corr_action_required"),
        ColumnDef::text("remarks", 255),
        ColumnDef::details("details"),
    ],
    required_message: "At least one inspection line is required.",
};

pub static PRODUCT_INSPECTION_PLANS: EntityDef = EntityDef {
    name: "product inspection plan",
    table_name: "product_inspection_plans",
    path_segment: "product-inspection-plans",
    columns: &[
        ColumnDef::required_text("item_id", 100),
        ColumnDef::required_text("item_description", 255),
        ColumnDef::text("plan_type", 100),
        ColumnDef::text("frequency", 100),
        ColumnDef::text("customer", 150),
        ColumnDef::text("contact_person", 150),
        ColumnDef::text("supplier_plant", 150),
        ColumnDef::text("customer_approval", 150),
        ColumnDef::text("doc_number", 50),
        ColumnDef::timestamp("plan_date"),
        ColumnDef::decimal("sample_size"),
        ColumnDef::text("prepared_by", 150),
        ColumnDef::text("revision_number", 50),
        ColumnDef::text("remarks", 255),
        ColumnDef::details("details"),
    ],
    required_message: "Item information and at least one plan row are required.",
};

pub static INCOMING_MATERIAL_INSPECTION_PLANS: EntityDef = EntityDef {
    name: "incoming material inspection plan",
    table_name: "incoming_material_inspection_plans",
    path_segment: "incoming-material-inspection-plans",
    columns: &[
        ColumnDef::required_text("item_id", 100),
        ColumnDef::required_text("item_description", 255),
        ColumnDef::text("doc_number", 50),
        ColumnDef::timestamp("doc_date"),
        ColumnDef::text("revision_number", 50),
        ColumnDef::text("prepared_by", 150),
        ColumnDef::text("remarks", 255),
        ColumnDef::details("details"),
    ],
    required_message: "Item information and at least one plan row are required.",
};

/// All record kinds, in route registration order.
pub static ENTITIES: [&EntityDef; 5] = [
    &PARAMETER_MASTER,
    &PRODUCT_INSPECTIONS,
    &INCOMING_MATERIAL_INSPECTIONS,
    &PRODUCT_INSPECTION_PLANS,
    &INCOMING_MATERIAL_INSPECTION_PLANS,
];

pub fn entity_by_path(path_segment: &str) -> Option<&'static EntityDef> {
    ENTITIES
        .iter()
        .copied()
        .find(|e| e.path_segment == path_segment)
}
