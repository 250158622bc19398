mod common;

use common::{entry, game_dir, open, refs, RefList, REFS};
use rds_assets::{
    converter, id_policy, AssetConverter, AssetDetails, AssetProvider, Error, Resource,
    ResourceConverter,
};
use rds_common::{AssetId, Game};
use std::sync::Arc;

/// Converts a reference list by converting everything it points at.
fn convert_refs() -> ResourceConverter {
    converter(|resource, details, converter| {
        let mut list = resource.downcast::<RefList>().ok_or_else(|| {
            Error::Other(format!("{details} did not decode as a reference list"))
        })?;
        for (_, id, _) in &mut list.refs {
            let new_id = converter.convert_id(AssetId::from(*id), details.original_game, false)?;
            *id = new_id.as_u64().unwrap_or(0) as u32;
        }
        Ok(list as Box<dyn Resource>)
    })
}

fn table(details: &AssetDetails) -> Option<ResourceConverter> {
    (details.asset_type == REFS).then(convert_refs)
}

#[test]
fn test_cycle_fails_with_conversion_cycle() {
    let dir = game_dir(
        Game::Prime,
        vec![(
            "a.pak",
            vec![
                entry(0xA, REFS, &refs(&[(REFS, 0xB, false)])),
                entry(0xB, REFS, &refs(&[(REFS, 0xA, false)])),
            ],
        )],
    );
    let prime = open(&dir, Game::Prime);
    let mut converter = AssetConverter::new(
        Game::Echoes,
        [&prime as &dyn AssetProvider],
        id_policy::hashed(Game::Echoes),
        table,
    );

    let result = converter.convert(AssetId::from(0xAu32), Game::Prime);
    assert!(matches!(result, Err(Error::ConversionCycle(_))));
    assert_eq!(converter.converted_assets().count(), 0);
}

#[test]
fn test_chain_is_memoised() {
    let dir = game_dir(
        Game::Prime,
        vec![(
            "a.pak",
            vec![
                entry(0xA, REFS, &refs(&[(REFS, 0xB, false)])),
                entry(0xB, REFS, &refs(&[(REFS, 0xC, false)])),
                entry(0xC, REFS, &refs(&[])),
            ],
        )],
    );
    let prime = open(&dir, Game::Prime);

    let mut generated = 0;
    let mut converter = AssetConverter::new(
        Game::Echoes,
        [&prime as &dyn AssetProvider],
        |_: &AssetDetails| {
            generated += 1;
            AssetId::from(0x5000u32 + generated)
        },
        table,
    );

    let a = converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap();
    let b_id = converter.converted_id(AssetId::from(0xBu32), Game::Prime).unwrap();
    let c_id = converter.converted_id(AssetId::from(0xCu32), Game::Prime).unwrap();
    assert_eq!(a.resource.downcast_ref::<RefList>().unwrap().refs[0].1 as u64, b_id.as_u64().unwrap());

    let b = converter.convert(AssetId::from(0xBu32), Game::Prime).unwrap();
    let b_again = converter.convert(AssetId::from(0xBu32), Game::Prime).unwrap();
    assert!(Arc::ptr_eq(&b, &b_again));
    assert_eq!(b.id, b_id);

    let c = converter.convert(AssetId::from(0xCu32), Game::Prime).unwrap();
    assert_eq!(c.id, c_id);
    assert_eq!(converter.converted_assets().count(), 3);
    drop(converter);
    assert_eq!(generated, 3);
}

#[test]
fn test_converted_assets_can_be_written_to_target() {
    let source = game_dir(
        Game::Prime,
        vec![(
            "a.pak",
            vec![
                entry(0xA, REFS, &refs(&[(REFS, 0xB, false)])),
                entry(0xB, REFS, &refs(&[])),
            ],
        )],
    );
    let target = game_dir(Game::Echoes, vec![("Metroid1.pak", vec![])]);
    let prime = open(&source, Game::Prime);
    let mut echoes = open(&target, Game::Echoes);

    let converted: Vec<_> = {
        let mut converter = AssetConverter::new(
            Game::Echoes,
            [&prime as &dyn AssetProvider],
            id_policy::sequential(0x7000u32),
            table,
        );
        converter.convert(AssetId::from(0xAu32), Game::Prime).unwrap();
        converter.converted_assets().cloned().collect()
    };

    for asset in &converted {
        echoes
            .create_decoded(asset.id, asset.resource.as_ref(), &["Metroid1.pak"])
            .unwrap();
    }

    let list: RefList = echoes.decoded(0x7000u32).unwrap();
    assert_eq!(list.refs, vec![(REFS, 0x7001, false)]);
    assert!(echoes.decoded::<RefList>(0x7001u32).unwrap().refs.is_empty());

    let out = tempfile::tempdir().unwrap();
    echoes.save(common::utf8(&out)).unwrap();
    assert_eq!(echoes.find_archives(0x7001u32).unwrap(), vec!["Metroid1.pak"]);
}
