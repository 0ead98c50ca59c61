use super::{Asset, AssetId, SortStrategy};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Orders `assets` in place by `strategy`.
///
/// Missing creation dates compare as the oldest possible timestamp. `size_of`
/// is consulted at most once per asset id and only for `Largest`. The sort is
/// stable, so ties keep their input order.
pub fn sort_assets<F>(assets: &mut [Asset], strategy: SortStrategy, mut size_of: F)
where
    F: FnMut(&Asset) -> u64,
{
    match strategy {
        SortStrategy::Newest => assets.sort_by_key(|a| Reverse(date_key(a))),
        SortStrategy::Oldest => assets.sort_by_key(date_key),
        SortStrategy::Largest => {
            let mut sizes: HashMap<AssetId, u64> = HashMap::with_capacity(assets.len());
            for asset in assets.iter() {
                if !sizes.contains_key(&asset.id) {
                    sizes.insert(asset.id.clone(), size_of(asset));
                }
            }
            assets.sort_by_key(|a| Reverse(sizes.get(&a.id).copied().unwrap_or(0)));
        }
    }
}

fn date_key(asset: &Asset) -> DateTime<Utc> {
    asset.creation_date.unwrap_or(DateTime::<Utc>::MIN_UTC)
}
