use bytes::Bytes;
use resp_proto::{Request, Value};

use super::{SortOrder, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{FromValue, bulk_reply, float_or_nil_reply, float_reply, integer_reply};
use crate::Error;

/// Distance unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeoUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl GeoUnit {
    fn token(self) -> &'static [u8] {
        match self {
            GeoUnit::Meters => b"m",
            GeoUnit::Kilometers => b"km",
            GeoUnit::Miles => b"mi",
            GeoUnit::Feet => b"ft",
        }
    }
}

/// Options for `GEORADIUS` / `GEORADIUSBYMEMBER`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoRadiusOptions {
    pub with_coord: bool,
    pub with_dist: bool,
    pub with_hash: bool,
    pub count: Option<u64>,
    /// Return as soon as `count` matches are found. Requires `count`.
    pub any: bool,
    pub order: Option<SortOrder>,
}

impl GeoRadiusOptions {
    fn annotated(&self) -> bool {
        self.with_coord || self.with_dist || self.with_hash
    }

    fn push<'a>(&self, mut req: Request<'a>) -> Result<Request<'a>, Error> {
        if self.any && self.count.is_none() {
            return Err(invalid("GEORADIUS ANY requires COUNT"));
        }
        req = req
            .arg_flag(self.with_coord, b"WITHCOORD")
            .arg_flag(self.with_dist, b"WITHDIST")
            .arg_flag(self.with_hash, b"WITHHASH");
        if let Some(count) = self.count {
            req = req.arg(b"COUNT").arg_uint(count).arg_flag(self.any, b"ANY");
        }
        if let Some(order) = self.order {
            req = req.arg(order.token());
        }
        Ok(req)
    }
}

/// A `GEORADIUS` match with whichever annotations were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMember {
    pub name: Bytes,
    pub dist: Option<f64>,
    pub hash: Option<i64>,
    /// `(longitude, latitude)`.
    pub coord: Option<(f64, f64)>,
}

/// `GEOADD key lon lat member [lon lat member ...]`. At least one item is
/// required.
pub fn geoadd<'a, M: AsRef<[u8]>>(
    key: &'a [u8],
    items: impl IntoIterator<Item = (f64, f64, M)>,
) -> Result<Request<'a>, Error> {
    let mut req = Request::cmd(b"GEOADD").arg(key);
    for (lon, lat, member) in items {
        req = req.arg_float(lon).arg_float(lat).arg_owned(member.as_ref());
    }
    if req.len() == 2 {
        return Err(invalid("GEOADD requires at least one item"));
    }
    Ok(req)
}

/// `GEORADIUS key lon lat radius unit [WITH...] [COUNT n [ANY]] [ASC|DESC]`.
pub fn georadius<'a>(
    key: &'a [u8],
    lon: f64,
    lat: f64,
    radius: f64,
    unit: GeoUnit,
    options: &GeoRadiusOptions,
) -> Result<Request<'a>, Error> {
    let req = Request::cmd(b"GEORADIUS")
        .arg(key)
        .arg_float(lon)
        .arg_float(lat)
        .arg_float(radius)
        .arg(unit.token());
    options.push(req)
}

/// `GEORADIUSBYMEMBER key member radius unit ...`.
pub fn georadiusbymember<'a>(
    key: &'a [u8],
    member: &'a [u8],
    radius: f64,
    unit: GeoUnit,
    options: &GeoRadiusOptions,
) -> Result<Request<'a>, Error> {
    let req = Request::cmd(b"GEORADIUSBYMEMBER")
        .arg(key)
        .arg(member)
        .arg_float(radius)
        .arg(unit.token());
    options.push(req)
}

fn coord_reply(value: Value) -> Result<Option<(f64, f64)>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::Array(pair) if pair.len() == 2 => {
            let mut iter = pair.into_iter();
            let (Some(lon), Some(lat)) = (iter.next(), iter.next()) else {
                return Err(Error::UnexpectedResponse);
            };
            Ok(Some((float_reply(lon)?, float_reply(lat)?)))
        }
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Radius matches. Annotated entries are `[name, dist?, hash?, coord?]` in
/// that order, each present only if requested.
fn radius_reply(value: Value, options: &GeoRadiusOptions) -> Result<Vec<GeoMember>, Error> {
    let Value::Array(items) = value else {
        return Err(Error::UnexpectedResponse);
    };
    items
        .into_iter()
        .map(|item| {
            if !options.annotated() {
                return Ok(GeoMember {
                    name: Bytes::from_value(item)?,
                    dist: None,
                    hash: None,
                    coord: None,
                });
            }
            let Value::Array(fields) = item else {
                return Err(Error::UnexpectedResponse);
            };
            let mut fields = fields.into_iter();
            let mut next = || fields.next().ok_or(Error::UnexpectedResponse);
            let name = Bytes::from_value(next()?)?;
            let dist = if options.with_dist { Some(float_reply(next()?)?) } else { None };
            let hash = if options.with_hash { Some(integer_reply(next()?)?) } else { None };
            let coord = if options.with_coord { coord_reply(next()?)? } else { None };
            Ok(GeoMember {
                name,
                dist,
                hash,
                coord,
            })
        })
        .collect()
}

impl<C: Connection> Client<C> {
    /// Add members with coordinates. Returns how many were new.
    pub async fn geoadd<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        items: impl IntoIterator<Item = (f64, f64, M)>,
    ) -> Result<i64, Error> {
        let req = geoadd(key.as_ref(), items)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Distance between two members, `None` if either is missing.
    pub async fn geodist(
        &mut self,
        key: impl AsRef<[u8]>,
        a: impl AsRef<[u8]>,
        b: impl AsRef<[u8]>,
        unit: GeoUnit,
    ) -> Result<Option<f64>, Error> {
        let req = Request::cmd(b"GEODIST")
            .arg(key.as_ref())
            .arg(a.as_ref())
            .arg(b.as_ref())
            .arg(unit.token());
        float_or_nil_reply(self.exec(&req).await?)
    }

    /// Geohash strings, `None` for missing members.
    pub async fn geohash<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<Vec<Option<String>>, Error> {
        let req = Request::cmd(b"GEOHASH").arg(key.as_ref()).args(members);
        let Value::Array(items) = self.exec(&req).await? else {
            return Err(Error::UnexpectedResponse);
        };
        items.into_iter().map(bulk_reply).collect()
    }

    /// `(longitude, latitude)` per member, `None` for missing members.
    pub async fn geopos<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<Vec<Option<(f64, f64)>>, Error> {
        let req = Request::cmd(b"GEOPOS").arg(key.as_ref()).args(members);
        let Value::Array(items) = self.exec(&req).await? else {
            return Err(Error::UnexpectedResponse);
        };
        items.into_iter().map(coord_reply).collect()
    }

    pub async fn georadius(
        &mut self,
        key: impl AsRef<[u8]>,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
        options: &GeoRadiusOptions,
    ) -> Result<Vec<GeoMember>, Error> {
        let req = georadius(key.as_ref(), lon, lat, radius, unit, options)?;
        radius_reply(self.exec(&req).await?, options)
    }

    pub async fn georadiusbymember(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
        radius: f64,
        unit: GeoUnit,
        options: &GeoRadiusOptions,
    ) -> Result<Vec<GeoMember>, Error> {
        let req = georadiusbymember(key.as_ref(), member.as_ref(), radius, unit, options)?;
        radius_reply(self.exec(&req).await?, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::args_of;
    use crate::MockConnection;

    fn bulk(s: &str) -> Value {
        Value::bulk_string(s.as_bytes())
    }

    #[test]
    fn radius_arguments() {
        let opts = GeoRadiusOptions {
            with_dist: true,
            count: Some(5),
            any: true,
            order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let req = georadius(b"g", 13.5, 38.25, 200.0, GeoUnit::Kilometers, &opts).unwrap();
        assert_eq!(
            args_of(&req),
            ["g", "13.5", "38.25", "200", "km", "WITHDIST", "COUNT", "5", "ANY", "ASC"]
        );
        let any_alone = GeoRadiusOptions {
            any: true,
            ..Default::default()
        };
        assert!(georadius(b"g", 0.0, 0.0, 1.0, GeoUnit::Meters, &any_alone).is_err());
    }

    #[test]
    fn geoadd_requires_items() {
        let none: Vec<(f64, f64, &str)> = Vec::new();
        assert!(matches!(geoadd(b"g", none), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn annotated_radius_reply() {
        let conn = MockConnection::connected().with_reply(&Value::array(vec![Value::array(vec![
            bulk("Palermo"),
            bulk("190.4424"),
            Value::array(vec![bulk("13.36"), bulk("38.11")]),
        ])]));
        let mut client = Client::new(conn);
        let opts = GeoRadiusOptions {
            with_dist: true,
            with_coord: true,
            ..Default::default()
        };
        let found = client
            .georadius("Sicily", 15.0, 37.0, 200.0, GeoUnit::Kilometers, &opts)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, Bytes::from_static(b"Palermo"));
        assert_eq!(found[0].dist, Some(190.4424));
        assert_eq!(found[0].hash, None);
        assert_eq!(found[0].coord, Some((13.36, 38.11)));
    }

    #[tokio::test]
    async fn geopos_with_missing_member() {
        let conn = MockConnection::connected().with_reply(&Value::array(vec![
            Value::array(vec![bulk("1.5"), bulk("2.5")]),
            Value::Null,
        ]));
        let mut client = Client::new(conn);
        assert_eq!(
            client.geopos("g", ["a", "b"]).await.unwrap(),
            vec![Some((1.5, 2.5)), None]
        );
    }
}
