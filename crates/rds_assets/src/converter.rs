//! Cross-game asset conversion.
//!
//! An [`AssetConverter`] translates an asset, and through the conversion
//! functions everything it references, from a source game's id space into a
//! target game's. One converter is one job: it remembers every asset it has
//! converted, so a shared dependency is converted once and every reference to
//! it gets the same new id.
//!
//! # Algorithm
//!
//! For `convert(id, source_game)`:
//!
//! 1. If `(source_game, id)` was already converted, return the cached result.
//! 2. If it is currently being converted, fail with [`Error::ConversionCycle`].
//! 3. Read the asset's type and decoded resource from the source game's provider.
//! 4. Allocate a target id through the id generator.
//! 5. Run the conversion function for the asset, which may recursively call
//!    [`convert_id`](AssetConverter::convert_id) for the ids it references.
//! 6. On success, memoise and return. On failure, nothing is memoised and the
//!    error is wrapped in [`Error::AssetConversionFailed`] for this asset, so a
//!    failure deep in a chain reads outermost asset first. Cycles are passed
//!    through unwrapped.
//!
//! Id generators and conversion functions are injected; see [`crate::id_policy`]
//! for the stock id generators.

use crate::error::{Error, Result};
use crate::format::Resource;
use crate::manager::AssetManager;
use rds_common::{AssetId, AssetType, Game};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Where a converter reads source assets from.
pub trait AssetProvider {
    fn game(&self) -> Game;

    fn asset_type(&self, asset_id: AssetId) -> Result<AssetType>;

    /// A freshly decoded copy of the asset.
    fn decoded(&self, asset_id: AssetId) -> Result<Box<dyn Resource>>;
}

impl AssetProvider for AssetManager {
    fn game(&self) -> Game {
        AssetManager::game(self)
    }

    fn asset_type(&self, asset_id: AssetId) -> Result<AssetType> {
        AssetManager::asset_type(self, asset_id)
    }

    fn decoded(&self, asset_id: AssetId) -> Result<Box<dyn Resource>> {
        self.decoded_asset(asset_id, None)
    }
}

/// The source asset a conversion step is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetDetails {
    pub asset_id: AssetId,
    pub asset_type: AssetType,
    pub original_game: Game,
}

impl fmt::Display for AssetDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} from {}", self.asset_type, self.asset_id, self.original_game)
    }
}

/// A converted asset, in the target game's id space.
#[derive(Debug)]
pub struct ConvertedAsset {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub resource: Box<dyn Resource>,
}

/// Converts one decoded resource. May call back into the converter.
pub type ResourceConverter = Arc<
    dyn Fn(Box<dyn Resource>, &AssetDetails, &mut AssetConverter<'_>) -> Result<Box<dyn Resource>>,
>;

/// Wrap a closure as a [`ResourceConverter`].
pub fn converter<F>(f: F) -> ResourceConverter
where
    F: Fn(Box<dyn Resource>, &AssetDetails, &mut AssetConverter<'_>) -> Result<Box<dyn Resource>>
        + 'static,
{
    Arc::new(f)
}

type IdGenerator<'a> = Box<dyn FnMut(&AssetDetails) -> AssetId + 'a>;
type ConverterTable<'a> = Box<dyn Fn(&AssetDetails) -> Option<ResourceConverter> + 'a>;

pub struct AssetConverter<'a> {
    target_game: Game,
    providers: HashMap<Game, &'a dyn AssetProvider>,
    id_generator: IdGenerator<'a>,
    converters: ConverterTable<'a>,
    converted_ids: HashMap<(Game, AssetId), AssetId>,
    converted_assets: HashMap<AssetId, Arc<ConvertedAsset>>,
    in_progress: HashSet<(Game, AssetId)>,
}

impl<'a> AssetConverter<'a> {
    /// Create a converter into `target_game`.
    ///
    /// * `providers` - source assets, one provider per game
    /// * `id_generator` - allocates the target id of each converted asset
    /// * `converters` - picks the conversion function for an asset, `None` if it can't be converted
    pub fn new<G, C>(
        target_game: Game,
        providers: impl IntoIterator<Item = &'a dyn AssetProvider>,
        id_generator: G,
        converters: C,
    ) -> Self
    where
        G: FnMut(&AssetDetails) -> AssetId + 'a,
        C: Fn(&AssetDetails) -> Option<ResourceConverter> + 'a,
    {
        Self {
            target_game,
            providers: providers
                .into_iter()
                .map(|provider| (provider.game(), provider))
                .collect(),
            id_generator: Box::new(id_generator),
            converters: Box::new(converters),
            converted_ids: HashMap::new(),
            converted_assets: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    pub fn target_game(&self) -> Game {
        self.target_game
    }

    pub fn invalid_asset_id(&self) -> AssetId {
        self.target_game.invalid_asset_id()
    }

    /// Convert an asset id, for use inside conversion functions.
    ///
    /// Ids that are invalid in `source_game` map to the target's invalid id.
    /// Ids of assets that don't exist do too when `missing_as_invalid` is set;
    /// otherwise the lookup error is returned.
    pub fn convert_id(
        &mut self,
        asset_id: AssetId,
        source_game: Game,
        missing_as_invalid: bool,
    ) -> Result<AssetId> {
        if !source_game.is_valid_asset_id(asset_id) {
            return Ok(self.invalid_asset_id());
        }

        match self.convert(asset_id, source_game) {
            Ok(converted) => Ok(converted.id),
            Err(Error::UnknownAssetId { .. } | Error::DeletedAsset { .. }) if missing_as_invalid => {
                tracing::debug!("{} is missing in {}, converting to invalid id", asset_id, source_game);
                Ok(self.invalid_asset_id())
            }
            Err(e) => Err(e),
        }
    }

    /// Convert an asset and, through its conversion function, its dependencies.
    pub fn convert(&mut self, asset_id: AssetId, source_game: Game) -> Result<Arc<ConvertedAsset>> {
        let key = (source_game, asset_id);
        if let Some(converted) = self
            .converted_ids
            .get(&key)
            .and_then(|new_id| self.converted_assets.get(new_id))
        {
            return Ok(Arc::clone(converted));
        }

        if !self.in_progress.insert(key) {
            return Err(Error::ConversionCycle(asset_id));
        }
        let result = self.convert_uncached(asset_id, source_game);
        self.in_progress.remove(&key);

        let converted = result?;
        self.converted_ids.insert(key, converted.id);
        self.converted_assets
            .insert(converted.id, Arc::clone(&converted));
        Ok(converted)
    }

    fn convert_uncached(&mut self, asset_id: AssetId, source_game: Game) -> Result<Arc<ConvertedAsset>> {
        let provider = *self
            .providers
            .get(&source_game)
            .ok_or(Error::MissingProvider(source_game))?;

        let details = AssetDetails {
            asset_id,
            asset_type: provider.asset_type(asset_id)?,
            original_game: source_game,
        };
        let resource = provider.decoded(asset_id)?;

        let new_id = (self.id_generator)(&details);
        tracing::debug!("Converting {} to {} in {}", details, new_id, self.target_game);

        let converted = self.run_converter(resource, &details).map_err(|e| match e {
            Error::ConversionCycle(_) => e,
            other => Error::AssetConversionFailed {
                id: asset_id,
                details,
                source: Box::new(other),
            },
        })?;

        Ok(Arc::new(ConvertedAsset {
            id: new_id,
            asset_type: converted.asset_type(),
            resource: converted,
        }))
    }

    fn run_converter(&mut self, resource: Box<dyn Resource>, details: &AssetDetails) -> Result<Box<dyn Resource>> {
        let convert = (self.converters)(details).ok_or(Error::NoConverter(details.asset_type))?;
        convert(resource, details, self)
    }

    /// Every asset converted so far.
    pub fn converted_assets(&self) -> impl Iterator<Item = &Arc<ConvertedAsset>> {
        self.converted_assets.values()
    }

    /// The target id `(source_game, asset_id)` was converted to, if any.
    pub fn converted_id(&self, asset_id: AssetId, source_game: Game) -> Option<AssetId> {
        self.converted_ids.get(&(source_game, asset_id)).copied()
    }
}

impl fmt::Debug for AssetConverter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetConverter")
            .field("target_game", &self.target_game)
            .field("converted", &self.converted_assets.len())
            .field("in_progress", &self.in_progress.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Dgrp, KnownResource};
    use crate::id_policy;
    use crate::test_support::{entry, fixture};
    use rds_common::AssetType;

    fn dgrp(refs: &[u32]) -> Vec<u8> {
        let dgrp = Dgrp::new(refs.iter().map(|id| (AssetType::DGRP, AssetId::from(*id))));
        KnownResource::build(&dgrp, Game::Prime).unwrap()
    }

    /// Rewrites every DGRP entry through the converter.
    fn convert_dgrp(missing_as_invalid: bool) -> ResourceConverter {
        converter(move |resource, details, converter| {
            let mut dgrp = resource
                .downcast::<Dgrp>()
                .ok_or_else(|| Error::decode(details.asset_type, "not a dependency group"))?;
            for entry in &mut dgrp.entries {
                entry.asset_id =
                    converter.convert_id(entry.asset_id, details.original_game, missing_as_invalid)?;
            }
            Ok(dgrp as Box<dyn Resource>)
        })
    }

    fn dgrp_only(missing_as_invalid: bool) -> impl Fn(&AssetDetails) -> Option<ResourceConverter> {
        move |details: &AssetDetails| {
            (details.asset_type == AssetType::DGRP).then(|| convert_dgrp(missing_as_invalid))
        }
    }

    fn entries(asset: &ConvertedAsset) -> Vec<AssetId> {
        asset
            .resource
            .downcast_ref::<Dgrp>()
            .unwrap()
            .entries
            .iter()
            .map(|e| e.asset_id)
            .collect()
    }

    #[test]
    fn test_chain_is_converted_and_memoised() {
        let (_dir, prime) = fixture(
            Game::Prime,
            vec![(
                "a.pak",
                vec![
                    entry(0xA, AssetType::DGRP, &dgrp(&[0xB])),
                    entry(0xB, AssetType::DGRP, &dgrp(&[0xC])),
                    entry(0xC, AssetType::DGRP, &dgrp(&[])),
                ],
            )],
        );

        let mut converter = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x1000u32),
            dgrp_only(false),
        );

        let a = converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap();
        assert_eq!(a.id, AssetId::from(0x1000u32));
        assert_eq!(entries(&a), vec![AssetId::from(0x1001u32)]);
        assert_eq!(converter.converted_assets().count(), 3);

        let b = converter.convert(AssetId::from(0xBu32), Game::Prime).unwrap();
        assert_eq!(b.id, AssetId::from(0x1001u32));
        assert_eq!(entries(&b), vec![AssetId::from(0x1002u32)]);
        assert!(Arc::ptr_eq(
            &b,
            &converter.convert(AssetId::from(0xBu32), Game::Prime).unwrap()
        ));
    }

    #[test]
    fn test_cycle_is_detected() {
        let (_dir, prime) = fixture(
            Game::Prime,
            vec![(
                "a.pak",
                vec![
                    entry(0xA, AssetType::DGRP, &dgrp(&[0xB])),
                    entry(0xB, AssetType::DGRP, &dgrp(&[0xA])),
                ],
            )],
        );
        let mut converter = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x1000u32),
            dgrp_only(false),
        );

        let err = converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap_err();
        assert!(matches!(err, Error::ConversionCycle(id) if id == AssetId::from(0xAu32)));
        assert_eq!(converter.converted_assets().count(), 0);
        assert_eq!(converter.converted_id(AssetId::from(0xBu32), Game::Prime), None);
    }

    #[test]
    fn test_missing_reference() {
        let archives = vec![("a.pak", vec![entry(0xA, AssetType::DGRP, &dgrp(&[0xDEAD]))])];

        let (_dir, prime) = fixture(Game::Prime, archives);
        let mut strict = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x1000u32),
            dgrp_only(false),
        );
        let err = strict.convert(AssetId::from(0xAu32), Game::Prime).unwrap_err();
        match err {
            Error::AssetConversionFailed { id, details, source } => {
                assert_eq!(id, AssetId::from(0xAu32));
                assert_eq!(details.asset_type, AssetType::DGRP);
                assert!(matches!(*source, Error::UnknownAssetId { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut lenient = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x1000u32),
            dgrp_only(true),
        );
        let a = lenient.convert(AssetId::from(0xAu32), Game::Prime).unwrap();
        assert_eq!(entries(&a), vec![Game::Echoes.invalid_asset_id()]);
    }

    #[test]
    fn test_nested_failure_is_wrapped_per_level() {
        let (_dir, prime) = fixture(
            Game::Prime,
            vec![(
                "a.pak",
                vec![
                    entry(0xA, AssetType::DGRP, &dgrp(&[0xB])),
                    entry(0xB, AssetType::DGRP, &dgrp(&[0xDEAD])),
                ],
            )],
        );
        let mut converter = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x1000u32),
            dgrp_only(false),
        );

        let err = converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap_err();
        let source = match err {
            Error::AssetConversionFailed { id, source, .. } => {
                assert_eq!(id, AssetId::from(0xAu32));
                source
            }
            other => panic!("unexpected error: {other}"),
        };
        match *source {
            Error::AssetConversionFailed { id, details, source } => {
                assert_eq!(id, AssetId::from(0xBu32));
                assert_eq!(details.asset_id, AssetId::from(0xBu32));
                assert!(matches!(*source, Error::UnknownAssetId { .. }));
            }
            other => panic!("unexpected cause: {other}"),
        }
        assert_eq!(converter.converted_assets().count(), 0);
    }

    #[test]
    fn test_invalid_source_id_maps_to_sentinel() {
        let (_dir, prime) = fixture(Game::Prime, vec![]);
        let mut converter = AssetConverter::new(
            Game::Corruption,
            [&prime as &dyn AssetProvider],
            id_policy::identity(),
            dgrp_only(false),
        );

        let id = converter
            .convert_id(Game::Prime.invalid_asset_id(), Game::Prime, false)
            .unwrap();
        assert_eq!(id, Game::Corruption.invalid_asset_id());
    }

    #[test]
    fn test_no_converter_and_no_provider() {
        let (_dir, prime) = fixture(
            Game::Prime,
            vec![("a.pak", vec![entry(0xA, AssetType::DGRP, &dgrp(&[]))])],
        );
        let mut converter = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::identity(),
            |_: &AssetDetails| None,
        );

        let err = converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap_err();
        assert!(matches!(err, Error::AssetConversionFailed { ref source, .. }
            if matches!(**source, Error::NoConverter(AssetType::DGRP))));

        let err = converter.convert(AssetId::from(0xAu32), Game::Echoes).unwrap_err();
        assert!(matches!(err, Error::MissingProvider(Game::Echoes)));
    }
}
