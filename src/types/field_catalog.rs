//! The fixed catalog of Hydrocron reach fields and validated selections of them.

use thiserror::Error;

/// Every field name the Hydrocron timeseries endpoint accepts for `feature=Reach`.
#[rustfmt::skip]
pub const VALID_FIELDS: &[&str] = &[
    "area_det_u", "area_detct", "area_total", "area_tot_u", "area_wse",
    "collection_shortname", "collection_version", "continent_id", "crid", "cycle_id",
    "dark_frac", "d_x_area", "d_x_area_u",
    "dschg_b", "dschg_b_q", "dschg_bsf", "dschg_b_u",
    "dschg_c", "dschg_c_q", "dschg_csf", "dschg_c_u",
    "dschg_gb", "dschg_gb_q", "dschg_gbsf", "dschg_gb_u",
    "dschg_gc", "dschg_gc_q", "dschg_gcsf", "dschg_gc_u",
    "dschg_gh", "dschg_gh_q", "dschg_ghsf", "dschg_gh_u",
    "dschg_gi", "dschg_gi_q", "dschg_gisf", "dschg_gi_u",
    "dschg_gm", "dschg_gm_q", "dschg_gmsf", "dschg_gm_u",
    "dschg_go", "dschg_go_q", "dschg_gosf", "dschg_go_u",
    "dschg_gq_b", "dschg_s", "dschg_s_q", "dschg_ssf", "dschg_s_u",
    "dschg_h", "dschg_h_q", "dschg_hsf", "dschg_h_u",
    "dschg_i", "dschg_i_q", "dschg_isf", "dschg_i_u",
    "dschg_m", "dschg_m_q", "dschg_msf", "dschg_m_u",
    "dschg_o", "dschg_o_q", "dschg_osf", "dschg_o_u",
    "dschg_q_b", "dry_trop_c", "geometry", "geoid_hght", "geoid_slop",
    "granuleUR", "ice_clim_f", "ice_dyn_f", "ingest_time", "iono_c",
    "layovr_val", "loc_offset", "load_tidef", "load_tideg", "n_good_nod",
    "n_reach_dn", "n_reach_up", "node_dist", "obs_frac_n", "p_dam_id",
    "p_dist_out", "p_lat", "p_length", "p_lon", "p_low_slp", "p_maf",
    "p_n_ch_max", "p_n_ch_mod", "p_n_nodes", "p_wid_var", "p_width",
    "p_wse", "p_wse_var", "partial_f", "pass_id", "pole_tide",
    "range_end_time", "range_start_time", "reach_id", "reach_q", "reach_q_b",
    "rch_id_dn", "rch_id_up", "river_name", "slope", "slope2", "slope2_r_u",
    "slope2_u", "slope_r_u", "slope_u", "solid_tide", "sword_version",
    "time", "time_str", "time_tai", "wse", "wse_c", "wse_c_u",
    "wse_r_u", "wse_u", "width", "width_c", "width_c_u", "width_u",
    "xovr_cal_c", "xovr_cal_q", "xtrk_dist",
];

/// Fields preselected when nothing else has been chosen.
pub const DEFAULT_FIELDS: &[&str] = &["reach_id", "time_str", "wse", "width"];

/// Returns `true` if `name` is a field Hydrocron knows about.
pub fn is_valid_field(name: &str) -> bool {
    VALID_FIELDS.contains(&name)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown Hydrocron field '{0}'")]
    UnknownField(String),

    #[error("No API fields selected")]
    NoFieldsSelected,
}

/// An ordered, duplicate-free, non-empty set of catalog fields.
///
/// The order is the order the names were first given in, and it is the order
/// the fields are sent to the API in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<String>,
}

impl FieldSelection {
    /// Validates `names` against [`VALID_FIELDS`].
    ///
    /// # Errors
    ///
    /// [`FieldError::UnknownField`] for the first name not in the catalog,
    /// [`FieldError::NoFieldsSelected`] if `names` is empty.
    pub fn new<I, S>(names: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !is_valid_field(name) {
                return Err(FieldError::UnknownField(name.to_string()));
            }
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        if fields.is_empty() {
            return Err(FieldError::NoFieldsSelected);
        }
        Ok(Self { fields })
    }

    /// The whole catalog, in catalog order.
    pub fn all() -> Self {
        Self {
            fields: VALID_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Comma-joined form used for the `fields` query parameter.
    pub fn to_query_value(&self) -> String {
        self.fields.join(",")
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}
