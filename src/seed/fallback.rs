use crate::core::Starship;

/// Built-in records used when the remote catalog cannot supply any.
pub fn fallback_starships() -> Vec<Starship> {
    vec![
        Starship::new("X-Wing", "T-65B", "Incom Corporation", "Starfighter", "1", "0"),
        Starship::new(
            "Millennium Falcon",
            "YT-1300",
            "Corellian Engineering Corporation",
            "Light Freighter",
            "2",
            "6",
        ),
        Starship::new(
            "TIE Fighter",
            "Twin Ion Engine/Ln",
            "Sienar Fleet Systems",
            "Starfighter",
            "1",
            "0",
        ),
    ]
}
