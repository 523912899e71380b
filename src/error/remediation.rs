// self
use crate::_prelude::*;

/// Xbox Live `XErr` codes with actionable descriptions.
const XBOX_LIVE_CODES: &[(i64, &str)] = &[
	(
		2_148_916_227,
		"The account was banned by Xbox for violating the Community Standards",
	),
	(2_148_916_229, "The account is restricted and cannot sign in until a parent grants access"),
	(
		2_148_916_233,
		"The account does not have an Xbox profile; sign in at minecraft.net once to create one",
	),
	(
		2_148_916_234,
		"The account has not accepted the Xbox Terms of Service; sign in at xbox.com to accept them",
	),
	(
		2_148_916_235,
		"The account is from a country or region where Xbox Live is not available",
	),
	(
		2_148_916_236,
		"The account requires adult verification on the Xbox page (South Korea)",
	),
	(
		2_148_916_237,
		"The account requires age verification on the Xbox page (South Korea)",
	),
	(
		2_148_916_238,
		"The account is a child account (under 18) and must be added to a family by an adult",
	),
];
/// Realms `errorCode` values with actionable descriptions.
const REALMS_CODES: &[(i64, &str)] = &[(
	6002,
	"The Minecraft Realms Terms of Service have not been accepted; accept them in the game client",
)];

/// Remote collaborators whose error codes are enriched independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collaborator {
	/// Microsoft account (login.live.com) OAuth endpoints.
	Msa,
	/// Xbox Live user authentication and XSTS authorization.
	XboxLive,
	/// Minecraft services (login and player certificates).
	Minecraft,
	/// Minecraft Realms.
	Realms,
}
impl Collaborator {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Collaborator::Msa => "msa",
			Collaborator::XboxLive => "xbox_live",
			Collaborator::Minecraft => "minecraft",
			Collaborator::Realms => "realms",
		}
	}

	/// Label used when rendering the numeric code.
	pub const fn code_label(self) -> &'static str {
		match self {
			Collaborator::Msa => "msa",
			Collaborator::XboxLive => "xbox live",
			Collaborator::Minecraft => "minecraft services",
			Collaborator::Realms => "realms",
		}
	}

	const fn table(self) -> &'static [(i64, &'static str)] {
		match self {
			Collaborator::XboxLive => XBOX_LIVE_CODES,
			Collaborator::Realms => REALMS_CODES,
			Collaborator::Msa | Collaborator::Minecraft => &[],
		}
	}
}
impl Display for Collaborator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Collaborator::Msa => "Microsoft account",
			Collaborator::XboxLive => "Xbox Live",
			Collaborator::Minecraft => "Minecraft services",
			Collaborator::Realms => "Realms",
		})
	}
}

/// Looks `code` up in `collaborator`'s own remediation table.
pub fn remediation(collaborator: Collaborator, code: i64) -> Option<&'static str> {
	collaborator.table().iter().find(|(known, _)| *known == code).map(|(_, text)| *text)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tables_are_disjoint_per_collaborator() {
		assert!(remediation(Collaborator::XboxLive, 2_148_916_233).is_some());
		assert!(remediation(Collaborator::Realms, 2_148_916_233).is_none());
		assert!(remediation(Collaborator::Realms, 6002).is_some());
		assert!(remediation(Collaborator::XboxLive, 6002).is_none());
		assert!(remediation(Collaborator::Minecraft, 6002).is_none());
	}
}
