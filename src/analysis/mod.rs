pub mod coherence;
pub mod entropy;
pub mod spectral;
pub mod summary;

pub use coherence::{compute_coherence, compute_phase_locking_value, DEFAULT_SYNC_BAND_HZ};
pub use entropy::{compute_spectral_entropy, entropy_from_variance};
pub use spectral::{
    classify_bands, classify_smoothed, compute_frequency_bands,
    compute_frequency_bands_display, display_correction, get_dominant_frequency,
    get_state_from_bands, welch_psd,
};
pub use summary::{compute_all, validate, AnalysisView};
